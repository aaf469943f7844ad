//! GraphQL subscription resolvers.
//!
//! Each field registers a subscriber on its topic when the subscription
//! starts. The registration lives as long as the returned stream, so a
//! client disconnect removes it from the bus.

use {
    async_graphql::{Context, Result, Subscription},
    tokio_stream::{Stream, StreamExt},
};

use crate::{
    gql_context,
    types::{Post, Product},
};

#[derive(Default)]
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Products created after the subscription started.
    async fn new_product(&self, ctx: &Context<'_>) -> Result<impl Stream<Item = Product>> {
        let c = gql_context!(ctx);
        Ok(c.events.new_product().subscribe().map(Product::from))
    }

    /// Drafts created after the subscription started.
    async fn new_post(&self, ctx: &Context<'_>) -> Result<impl Stream<Item = Post>> {
        let c = gql_context!(ctx);
        Ok(c.events.new_post().subscribe().map(Post::from))
    }

    /// Posts that went from unpublished to published, as they were before
    /// the toggle.
    async fn post_published(&self, ctx: &Context<'_>) -> Result<impl Stream<Item = Post>> {
        let c = gql_context!(ctx);
        Ok(c.events.post_published().subscribe().map(Post::from))
    }
}
