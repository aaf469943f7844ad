//! GraphQL query resolvers.

use {
    async_graphql::{Context, Object, Result},
    storefront_store::{Page, PostQuery, ProductQuery},
    tracing::debug,
};

use crate::{
    error::{store_err, validation_err},
    gql_context,
    types::{Post, Product, User},
};

/// Turn the optional `skip`/`take` arguments into a page window.
///
/// Omitted arguments mean no offset and no limit. Zero is a real zero.
fn page(skip: Option<i32>, take: Option<i32>) -> Result<Page> {
    let window = |field: &'static str, value: Option<i32>| match value {
        Some(n) if n < 0 => Err(validation_err(field, format!("must not be negative, got {n}"))),
        Some(n) => Ok(Some(u64::from(n.unsigned_abs()))),
        None => Ok(None),
    };
    Ok(Page::new(window("skip", skip)?, window("take", take)?))
}

// ── Root ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every user, oldest first. Not paginated.
    async fn all_users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let c = gql_context!(ctx);
        let users = c.data.list_users().await.map_err(store_err)?;
        Ok(users.into_iter().map(User::from).collect())
    }

    /// Published posts, oldest first. A non-empty `searchString` keeps only
    /// posts whose title or content contains it.
    async fn feed(
        &self,
        ctx: &Context<'_>,
        search_string: Option<String>,
        skip: Option<i32>,
        take: Option<i32>,
    ) -> Result<Vec<Post>> {
        let query = PostQuery::feed(search_string, page(skip, take)?);
        let c = gql_context!(ctx);
        let posts = c.data.list_posts(&query).await.map_err(store_err)?;
        debug!(count = posts.len(), "feed resolved");
        Ok(posts.into_iter().map(Post::from).collect())
    }

    /// Products, newest first. A non-empty `searchString` keeps only products
    /// whose name or description contains it.
    async fn products(
        &self,
        ctx: &Context<'_>,
        search_string: Option<String>,
        skip: Option<i32>,
        take: Option<i32>,
    ) -> Result<Vec<Product>> {
        let query = ProductQuery::new(search_string, page(skip, take)?);
        let c = gql_context!(ctx);
        let products = c.data.list_products(&query).await.map_err(store_err)?;
        debug!(count = products.len(), "products resolved");
        Ok(products.into_iter().map(Product::from).collect())
    }
}
