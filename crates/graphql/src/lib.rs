//! GraphQL API for the storefront.
//!
//! Defines the entity graph (`User`, `Post`, `Product`), the query and
//! mutation roots that map onto [`storefront_store::DataSource`] calls, and
//! the subscription root fed by the in-process [`EventBus`].
//!
//! The gateway crate builds the HTTP handlers and wires them into the router.
//! This crate only defines the schema, types, and resolvers.

pub mod context;
pub mod error;
pub mod events;
pub mod loaders;
pub mod mutations;
pub mod queries;
pub mod schema;
pub mod subscriptions;
pub mod types;

pub use {
    context::GqlContext,
    events::{EventBus, Topic},
    schema::{StorefrontSchema, build_schema, schema_sdl},
};

// ── Shared resolver macros ──────────────────────────────────────────────────

/// Fetch the shared [`GqlContext`] from a resolver context, propagating a
/// GraphQL error if the schema was built without it.
#[macro_export]
macro_rules! gql_context {
    ($ctx:expr) => {
        $ctx.data::<std::sync::Arc<$crate::context::GqlContext>>()?
    };
}
