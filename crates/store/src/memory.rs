//! In-memory data source for tests and `--in-memory` runs. Nothing is persisted.

use std::{
    cmp::Reverse,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    store::DataSource,
    types::{
        EntityKind, NewPost, NewProduct, NewUser, Post, PostQuery, Product, ProductQuery, User,
        new_id, now_ms,
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    products: Vec<Product>,
}

/// Data source backed by insertion-ordered vectors behind a mutex.
#[derive(Default)]
pub struct MemoryDataSource {
    tables: Mutex<Tables>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables().users.clone())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(Error::validation(
                "email",
                format!("{} is already registered", user.email),
            ));
        }
        let record = User {
            id: new_id(),
            name: user.name,
            email: user.email,
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.tables().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let tables = self.tables();
        let matching = tables.posts.iter().filter(|p| query.matches(p)).cloned();
        Ok(query.page.apply(matching))
    }

    async fn posts_by_authors(&self, user_ids: &[String]) -> Result<Vec<Post>> {
        Ok(self
            .tables()
            .posts
            .iter()
            .filter(|p| p.author_id.as_ref().is_some_and(|a| user_ids.contains(a)))
            .cloned()
            .collect())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables();
        let author_id = match post.author_email {
            Some(email) => {
                let author = tables
                    .users
                    .iter()
                    .find(|u| u.email == email)
                    .ok_or_else(|| Error::not_found_by(EntityKind::User, "email", email.clone()))?;
                Some(author.id.clone())
            },
            None => None,
        };
        let record = Post {
            id: new_id(),
            title: post.title,
            content: post.content,
            published: false,
            author_id,
            created_at: now_ms(),
        };
        tables.posts.push(record.clone());
        Ok(record)
    }

    async fn set_post_published(&self, id: &str, published: bool) -> Result<Post> {
        let mut tables = self.tables();
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found(EntityKind::Post, id))?;
        post.published = published;
        Ok(post.clone())
    }

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.tables().products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let tables = self.tables();
        // Newest insert first, then a stable sort keeps that order among equal timestamps.
        let mut matching: Vec<Product> = tables
            .products
            .iter()
            .rev()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by_key(|p| Reverse(p.created_at));
        Ok(query.page.apply(matching))
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let record = Product {
            id: new_id(),
            name: product.name,
            image: product.image,
            price: product.price,
            description: product.description,
            created_at: now_ms(),
        };
        self.tables().products.push(record.clone());
        Ok(record)
    }
}
