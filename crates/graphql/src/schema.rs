//! Schema construction and type alias.

use std::sync::Arc;

use {
    async_graphql::{Schema, dataloader::DataLoader},
    storefront_store::DataSource,
};

use crate::{
    context::GqlContext,
    events::EventBus,
    loaders::{AuthorLoader, PostsByAuthorLoader},
    mutations::MutationRoot,
    queries::QueryRoot,
    subscriptions::SubscriptionRoot,
};

/// The full storefront GraphQL schema type.
pub type StorefrontSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the GraphQL schema over a data source and an event bus.
///
/// The relation loaders share the same data source as the resolvers. The bus
/// is cloned into the context, so callers can keep their own handle to
/// inspect or publish on it.
pub fn build_schema(data: Arc<dyn DataSource>, events: EventBus) -> StorefrontSchema {
    let authors = DataLoader::new(AuthorLoader::new(Arc::clone(&data)), tokio::spawn);
    let posts_by_author = DataLoader::new(PostsByAuthorLoader::new(Arc::clone(&data)), tokio::spawn);
    let ctx = Arc::new(GqlContext::new(data, events));

    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(ctx)
        .data(authors)
        .data(posts_by_author)
        .finish()
}

/// The schema in SDL form, without any data attached.
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .finish()
        .sdl()
}
