//! Router construction and the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::metrics::{self, RecorderSink};
use crate::store::InMemoryBookStore;

/// Build the book API router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::greeting))
        .route(
            "/books",
            post(handlers::create_book)
                .get(handlers::list_books)
                .put(handlers::replace_book),
        )
        .route(
            "/books/:id",
            get(handlers::get_book)
                .patch(handlers::patch_book)
                .delete(handlers::delete_book),
        )
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

/// A book API server running on a background task.
///
/// Mostly useful in tests: start it on a random port, point a
/// [`BookClient`](crate::BookClient) at [`BookServer::url`] and shut it down
/// when done.
pub struct BookServer {
    url: String,
    addr: SocketAddr,
    handle: JoinHandle<std::io::Result<()>>,
    state: AppState,
}

impl BookServer {
    /// Start a server on a random local port.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start(state: AppState) -> Result<Self> {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0)), state).await
    }

    /// Start a server on `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());

        let handle = tokio::spawn(async move { axum::serve(listener, app).await });
        tracing::debug!(%addr, "book server started");

        Ok(Self {
            url: format!("http://{addr}"),
            addr,
            handle,
            state,
        })
    }

    /// Base URL of the server.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// State shared with the handlers.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Stop the server. In-flight requests are dropped.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

/// Run the book API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the exporter or listener cannot be set up, or if
/// seeding fails.
pub async fn run(config: ServerConfig) -> Result<()> {
    if let Some(metrics_addr) = config.metrics_addr {
        metrics::install_prometheus(metrics_addr)?;
    }

    let store = InMemoryBookStore::new();
    if config.seed {
        Fixtures::seed(&store).await?;
    }

    let state = AppState::new(Arc::new(store), Arc::new(RecorderSink));
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "book API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("book API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
