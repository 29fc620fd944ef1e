//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use cleanchain_node::LifecycleEngine;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::RpcError;
use crate::handlers;

/// Shared state handed to every handler.
pub struct RpcState {
    pub engine: Arc<LifecycleEngine>,
    pub enable_metrics: bool,
}

/// Build the API router over `state`.
pub fn router(state: Arc<RpcState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/locations", get(handlers::list_locations))
        .route("/api/locations/:id", get(handlers::get_location))
        .route("/api/claim-location", post(handlers::claim_location))
        .route("/api/vote", post(handlers::vote))
        .route("/api/test-distance", get(handlers::test_distance))
        .route("/api/user/:wallet/locations", get(handlers::user_locations))
        .route("/api/upload-complete/:id", post(handlers::upload_complete))
        .route("/auth/wallet-login", post(handlers::wallet_login))
        .route("/auth/update-profile", patch(handlers::update_profile))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(cors)
        .with_state(state)
}

pub struct RpcServer {
    pub host: String,
    pub port: u16,
    state: Arc<RpcState>,
}

impl RpcServer {
    pub fn new(host: impl Into<String>, port: u16, state: RpcState) -> Self {
        Self {
            host: host.into(),
            port,
            state: Arc::new(state),
        }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))?;
        let local: SocketAddr = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!(%local, "HTTP API listening");

        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        info!("HTTP API stopped");
        Ok(())
    }
}
