//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tally_store::GovernanceStore;
use tower_http::cors::CorsLayer;

use crate::error::RpcError;
use crate::handlers;

pub const API_PREFIX: &str = "/power_voting/api";

/// Shared handler state.
#[derive(Clone)]
pub struct RpcState {
    pub store: Arc<dyn GovernanceStore>,
    /// Served at `/metrics` when present.
    pub registry: Option<prometheus::Registry>,
}

/// Build the full router.
pub fn router(state: RpcState) -> Router {
    let api = Router::new()
        .route("/health_check", get(handlers::health_check))
        .route("/proposal/result", get(handlers::proposal_result))
        .route("/proposal/history", get(handlers::proposal_history));

    Router::new()
        .nest(API_PREFIX, api)
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct RpcServer {
    pub port: u16,
    state: RpcState,
}

impl RpcServer {
    pub fn new(port: u16, state: RpcState) -> Self {
        Self { port, state }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        tracing::info!(%addr, "RPC server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
