//! In-memory Furnistore backend.
//!
//! Serves the same JSON endpoints as the shop backend under
//! [`API_PREFIX`], seeded with a demo user and a two-line cart. Faults can be
//! armed per request kind to exercise the storefront's failure handling.
//!
//! - [`state`]: shop data and fault switches
//! - [`routes`]: HTTP handlers
//! - [`auth`]: bearer-token extractor and token issuing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub use config::MockBackendConfig;
pub use state::{AppState, Fault};

/// Path under which every API route is mounted.
pub const API_PREFIX: &str = "/furniture-store/api";

/// Build the router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, routes::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// A backend running on a background task.
///
/// The task is aborted when this is dropped.
pub struct MockServer {
    addr: SocketAddr,
    state: AppState,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Bind `config.socket_addr()` and serve in the background.
    ///
    /// Use port 0 to pick a free port.
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound.
    pub async fn spawn(config: &MockBackendConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.socket_addr()).await?;
        let addr = listener.local_addr()?;
        let state = AppState::new(config);
        let router = app(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        tracing::debug!(%addr, "Mock backend spawned");
        Ok(Self { addr, state, task })
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:50123/furniture-store/api`.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}{API_PREFIX}", self.addr)
    }

    /// Shared state, for arming faults and inspecting data.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
