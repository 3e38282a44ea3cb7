//! Request extractors that reject with [`ApiError`].
//!
//! Axum's own rejections bypass the metrics sink, so path and body parsing go
//! through these wrappers instead. A rejected request never reaches its
//! handler, so the wrappers count the `books` call themselves.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};

use crate::api::{ApiError, AppState};
use crate::metrics::BOOKS;
use crate::Book;

fn rejected(state: &AppState, message: String) -> ApiError {
    state.metrics().increment(BOOKS);
    state.reject(ApiError::BadInput(message))
}

/// Book identity taken from the `{id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookId(pub u64);

#[async_trait]
impl FromRequestParts<AppState> for BookId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Path::<u64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => Err(rejected(state, rejection.body_text())),
        }
    }
}

/// A full book representation from a JSON request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookBody(pub Book);

#[async_trait]
impl FromRequest<AppState> for BookBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        match Json::<Book>::from_request(req, state).await {
            Ok(Json(book)) => Ok(Self(book)),
            Err(rejection) => Err(rejected(state, rejection.body_text())),
        }
    }
}
