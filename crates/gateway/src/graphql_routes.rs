//! `/graphql` routing.
//!
//! POST goes straight to the async-graphql service. GET serves the GraphiQL
//! page or, when the request carries a WebSocket handshake, opens a
//! subscription socket. Both sit behind [`require_graphql_enabled`].

use {
    async_graphql::http::{ALL_WEBSOCKET_PROTOCOLS, GraphiQLSource},
    async_graphql_axum::{GraphQL, GraphQLProtocol, GraphQLWebSocket},
    axum::{
        Json, Router,
        extract::{Request, State, WebSocketUpgrade, ws::rejection::WebSocketUpgradeRejection},
        http::StatusCode,
        middleware::{self, Next},
        response::{Html, IntoResponse, Response},
        routing::get,
    },
    tracing::info,
};

use crate::server::AppState;

/// Router for `/graphql`, gated on the runtime enable flag.
pub fn graphql_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/graphql",
            get(graphql_get_handler).post_service(GraphQL::new(state.graphql_schema.clone())),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_graphql_enabled,
        ))
}

/// Answer 503 for every `/graphql` request while GraphQL is switched off.
pub async fn require_graphql_enabled(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.gateway.is_graphql_enabled() {
        return next.run(req).await;
    }
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "error": "graphql server is disabled" })),
    )
        .into_response()
}

/// A handshake without a GraphQL subprotocol is refused with 400. A plain GET
/// gets GraphiQL, or 404 when the page is turned off.
async fn graphql_get_handler(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    protocol: Result<GraphQLProtocol, StatusCode>,
) -> Response {
    match (upgrade, protocol) {
        (Ok(ws), Ok(protocol)) => subscription_socket(state, ws, protocol),
        (Ok(_), Err(status)) => status.into_response(),
        (Err(_), _) if state.gateway.graphiql => Html(
            GraphiQLSource::build()
                .endpoint("/graphql")
                .subscription_endpoint("/graphql")
                .finish(),
        )
        .into_response(),
        (Err(_), _) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn subscription_socket(state: AppState, ws: WebSocketUpgrade, protocol: GraphQLProtocol) -> Response {
    let AppState {
        gateway,
        graphql_schema,
    } = state;
    ws.protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| async move {
            let socket_guard = gateway.track_socket();
            info!(
                protocol = ?protocol,
                open = gateway.open_sockets(),
                "subscription socket opened"
            );
            GraphQLWebSocket::new(socket, graphql_schema, protocol)
                .serve()
                .await;
            drop(socket_guard);
            info!(open = gateway.open_sockets(), "subscription socket closed");
        })
}
