use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use storefront_config::GraphqlConfig;

/// Process-wide gateway settings shared by the HTTP handlers.
pub struct GatewayState {
    pub version: String,
    /// Serve the GraphiQL page on a plain `GET /graphql`.
    pub graphiql: bool,
    graphql_enabled: AtomicBool,
    open_sockets: AtomicUsize,
}

impl GatewayState {
    pub fn new(graphql: &GraphqlConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            graphiql: graphql.graphiql,
            graphql_enabled: AtomicBool::new(graphql.enabled),
            open_sockets: AtomicUsize::new(0),
        }
    }

    pub fn is_graphql_enabled(&self) -> bool {
        self.graphql_enabled.load(Ordering::Relaxed)
    }

    pub fn set_graphql_enabled(&self, enabled: bool) {
        self.graphql_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Subscription sockets currently being served.
    pub fn open_sockets(&self) -> usize {
        self.open_sockets.load(Ordering::SeqCst)
    }

    /// Count a subscription socket as open until the guard is dropped.
    pub fn track_socket(self: &Arc<Self>) -> SocketGuard {
        self.open_sockets.fetch_add(1, Ordering::SeqCst);
        SocketGuard {
            state: Arc::clone(self),
        }
    }
}

pub struct SocketGuard {
    state: Arc<GatewayState>,
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        self.state.open_sockets.fetch_sub(1, Ordering::SeqCst);
    }
}
