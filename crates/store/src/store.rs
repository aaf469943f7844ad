use async_trait::async_trait;

use crate::{
    error::Result,
    types::{NewPost, NewProduct, NewUser, Post, PostQuery, Product, ProductQuery, User},
};

/// Storage interface consumed by the GraphQL resolvers.
///
/// Implementations own all entity state. Lookups return `Ok(None)` when a
/// record is missing; writes that reference a missing record fail with
/// [`Error::NotFound`](crate::Error::NotFound).
#[async_trait]
pub trait DataSource: Send + Sync {
    // ── Users ──

    /// All users in insertion order.
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Batch lookup. Unknown ids are skipped; order is unspecified.
    async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<User>>;
    /// Insert a user. Not reachable from the API; used for seeding.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    // ── Posts ──

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>>;
    /// Posts matching the query, in insertion order, windowed by its page.
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>>;
    /// Posts written by any of the given authors, in insertion order.
    async fn posts_by_authors(&self, user_ids: &[String]) -> Result<Vec<Post>>;
    /// Insert a draft, linking `author_email` to an existing user.
    async fn create_post(&self, post: NewPost) -> Result<Post>;
    /// Overwrite the published flag and return the updated record.
    async fn set_post_published(&self, id: &str, published: bool) -> Result<Post>;

    // ── Products ──

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>>;
    /// Products matching the query, newest first, windowed by its page.
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;
    async fn create_product(&self, product: NewProduct) -> Result<Product>;
}
