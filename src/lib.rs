//! Book record API.
//!
//! An HTTP service exposing CRUD endpoints over a collection of books, with
//! partial updates following merge-patch semantics: an absent field is left
//! alone, an explicit `null` clears it and a value replaces it.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bookapi::{AppState, BookClient, BookPatch, BookServer, InMemoryBookStore, InMemoryMetrics};
//!
//! #[tokio::main]
//! async fn main() -> bookapi::Result<()> {
//!     let state = AppState::new(
//!         Arc::new(InMemoryBookStore::new()),
//!         Arc::new(InMemoryMetrics::new()),
//!     );
//!     let server = BookServer::start(state).await?;
//!     let client = BookClient::new(server.url())?;
//!
//!     let id = client.create(&bookapi::Book::titled("Dune")).await?;
//!     client.patch(id, &BookPatch::new().author("Frank Herbert")).await?;
//!     println!("{:?}", client.get(id).await?);
//!
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`patch`] - tri-state field directives and the patch resolver
//! - [`classify`] - maps store failures to API outcomes by walking the cause chain
//! - [`metrics`] - the counters and timers the handlers emit, behind [`MetricsSink`]
//! - [`store`] - the [`BookRepository`] seam and its in-memory implementation
//! - [`api`] - the axum router, handlers and server
//!
//! # Configuration
//!
//! The server reads `BOOKS_BIND_ADDR`, `BOOKS_METRICS_ADDR` and `BOOKS_SEED`
//! (see [`ServerConfig`]); the client reads `BOOKS_API_URL`.

pub mod api;
pub mod classify;
pub mod cli;
mod client;
mod config;
mod error;
pub mod metrics;
mod models;
mod output;
pub mod patch;
pub mod store;

pub use api::{ApiError, AppState, BookServer};
pub use classify::ErrorClassifier;
pub use client::{BookClient, ReplaceOutcome};
pub use config::ServerConfig;
pub use error::{BookError, Result};
pub use metrics::{InMemoryMetrics, MetricsSink, RecorderSink};
pub use models::{Book, FieldViolation, ValidationError, MAX_FIELD_LEN};
pub use output::PrettyPrint;
pub use patch::{resolve, BookPatch, FieldPatch, ResolveError};
pub use store::{BookRepository, InMemoryBookStore, StoreError};
