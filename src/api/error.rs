//! API error taxonomy.
//!
//! Every failed request ends as exactly one [`ApiError`]. The response body
//! carries a stable code and a short message; causes from the store are
//! logged, never sent to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::metrics::{BOOKS_BAD_INPUT, BOOKS_ERROR};
use crate::patch::ResolveError;

/// Errors returned by the book API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed body, wrong field type or a client-supplied identity.
    #[error("{0}")]
    BadInput(String),

    /// A patch document tried to set the identity.
    #[error("Id should not be specified")]
    IdentityConflict,

    /// The referenced book does not exist.
    #[error("Book with id: {0} not found")]
    NotFound(u64),

    /// The store rejected the write because of a data-integrity rule.
    #[error("Invalid request")]
    ConstraintViolation,

    /// Anything else.
    #[error("Something went wrong processing the request")]
    Internal,
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadInput(_) | Self::ConstraintViolation => StatusCode::BAD_REQUEST,
            Self::IdentityConflict => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadInput(_) => "BAD_REQUEST",
            Self::IdentityConflict => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
            Self::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Counter to increment when this error is returned.
    pub fn metric(&self) -> &'static str {
        match self {
            Self::Internal => BOOKS_ERROR,
            _ => BOOKS_BAD_INPUT,
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::BadInput(message) => Self::BadInput(message),
            ResolveError::IdentityConflict => Self::IdentityConflict,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// See [`ApiError::code`].
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}
