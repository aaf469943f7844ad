//! Batch loaders for the entity relations.
//!
//! Every `User.posts` and `Post.author` field in one response is collected by
//! the schema's `DataLoader`s and answered with a single data source call per
//! relation.

use std::{collections::HashMap, sync::Arc};

use {
    async_graphql::dataloader::Loader,
    storefront_store::{DataSource, Post, User},
};

use crate::error::store_err;

/// Loads users by id. Backs `Post.author`.
pub struct AuthorLoader {
    data: Arc<dyn DataSource>,
}

impl AuthorLoader {
    pub fn new(data: Arc<dyn DataSource>) -> Self {
        Self { data }
    }
}

impl Loader<String> for AuthorLoader {
    type Value = User;
    type Error = async_graphql::Error;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let users = self.data.users_by_ids(keys).await.map_err(store_err)?;
        Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
    }
}

/// Loads the posts of each author id, oldest first. Backs `User.posts`.
pub struct PostsByAuthorLoader {
    data: Arc<dyn DataSource>,
}

impl PostsByAuthorLoader {
    pub fn new(data: Arc<dyn DataSource>) -> Self {
        Self { data }
    }
}

impl Loader<String> for PostsByAuthorLoader {
    type Value = Vec<Post>;
    type Error = async_graphql::Error;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let posts = self.data.posts_by_authors(keys).await.map_err(store_err)?;
        let mut map: HashMap<String, Self::Value> = HashMap::new();
        for post in posts {
            if let Some(author_id) = post.author_id.clone() {
                map.entry(author_id).or_default().push(post);
            }
        }
        Ok(map)
    }
}
