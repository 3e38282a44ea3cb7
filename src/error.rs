//! Error types for the book client, CLI and server startup.
//!
//! Errors returned *by the API* to its callers live in
//! [`crate::api::ApiError`]; this module covers everything on the calling
//! side of the wire and around it.

use thiserror::Error;

/// Errors that can occur when talking to or running the book API.
#[derive(Debug, Error)]
pub enum BookError {
    /// Configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Book not found.
    #[error("book {id} not found")]
    NotFound { id: u64 },

    /// The API rejected the request.
    #[error("book API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The book store failed outside of a request, e.g. while seeding.
    #[error("book store: {0}")]
    Store(#[from] crate::store::StoreError),

    /// The metrics exporter could not be installed.
    #[error("metrics exporter: {0}")]
    Metrics(String),
}

impl BookError {
    /// HTTP status returned by the API, if this error came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::ApiError { status_code, .. } => *status_code,
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for book API operations.
pub type Result<T> = core::result::Result<T, BookError>;
