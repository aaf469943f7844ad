//! HTTP transport for the storefront GraphQL API.
//!
//! Serves `/graphql` (GraphiQL and WebSocket subscriptions on GET, execution
//! on POST) and `/health`.

pub mod graphql_routes;
pub mod server;
pub mod state;

pub use {
    server::{AppState, build_gateway_app, open_data_source, start_gateway},
    state::GatewayState,
};
