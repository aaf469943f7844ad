//! Per-schema context shared by every resolver.

use std::sync::Arc;

use storefront_store::DataSource;

use crate::events::EventBus;

/// Context injected into every GraphQL resolver via `Context::data()`.
///
/// Resolvers hold no state of their own: entity storage lives behind `data`
/// and the only shared mutable state is the subscriber registry in `events`.
pub struct GqlContext {
    pub data: Arc<dyn DataSource>,
    pub events: EventBus,
}

impl GqlContext {
    pub fn new(data: Arc<dyn DataSource>, events: EventBus) -> Self {
        Self { data, events }
    }
}
