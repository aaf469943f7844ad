use std::{net::SocketAddr, sync::Arc};

use {
    anyhow::Context as _,
    axum::{
        Router,
        extract::State,
        response::{IntoResponse, Json},
        routing::get,
    },
    storefront_config::{StorefrontConfig, data_dir},
    storefront_graphql::{EventBus, StorefrontSchema, build_schema},
    storefront_store::{DataSource, MemoryDataSource, SqliteDataSource},
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{graphql_routes::graphql_router, state::GatewayState};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
    pub graphql_schema: StorefrontSchema,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>, graphql_schema: StorefrontSchema) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app_state = AppState {
        gateway: state,
        graphql_schema,
    };

    Router::new()
        .route("/health", get(health_handler))
        .merge(graphql_router(&app_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Open the configured data source. SQLite databases are migrated on open.
pub async fn open_data_source(
    config: &StorefrontConfig,
    in_memory: bool,
) -> anyhow::Result<Arc<dyn DataSource>> {
    if in_memory {
        info!("using in-memory data source");
        return Ok(Arc::new(MemoryDataSource::new()));
    }

    let data_dir = data_dir();
    if config.database.url.is_none() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
    }
    let url = config.database.url_or_default(&data_dir);
    let source = SqliteDataSource::connect(&url, config.database.max_connections)
        .await
        .with_context(|| format!("failed to open database {url}"))?;
    info!(url = %url, "database ready");
    Ok(Arc::new(source))
}

/// Start the gateway HTTP + WebSocket server and serve until Ctrl-C.
pub async fn start_gateway(
    config: &StorefrontConfig,
    data: Arc<dyn DataSource>,
) -> anyhow::Result<()> {
    let events = EventBus::new(config.graphql.subscriber_queue);
    let schema = build_schema(data, events);
    let state = Arc::new(GatewayState::new(&config.graphql));
    if !state.is_graphql_enabled() {
        warn!("graphql is disabled in config, /graphql will answer 503");
    }
    let app = build_gateway_app(state, schema);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "storefront listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("storefront stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.gateway.version,
    }))
}
