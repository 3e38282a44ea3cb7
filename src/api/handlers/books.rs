//! Book endpoint handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::extract::{BookBody, BookId};
use crate::api::{ApiError, AppState};
use crate::metrics::BOOKS;
use crate::patch::resolve;
use crate::Book;

/// `201 Created` pointing at the stored book.
fn created(book: &Book) -> Response {
    let location = book
        .id
        .and_then(|id| HeaderValue::from_str(&format!("/books/{id}")).ok());

    match location {
        Some(location) => (StatusCode::CREATED, [(header::LOCATION, location)]).into_response(),
        None => StatusCode::CREATED.into_response(),
    }
}

/// GET /books
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    tracing::info!("GET /books");
    state.metrics().increment(BOOKS);

    let books = state.books().find_all().await.map_err(|e| state.fail(e))?;
    tracing::debug!(count = books.len(), "GET /books. returning books");

    Ok(Json(books))
}

/// GET /books/{id}
pub async fn get_book(
    State(state): State<AppState>,
    BookId(id): BookId,
) -> Result<Json<Book>, ApiError> {
    tracing::info!("GET /books/{id}");
    state.metrics().increment(BOOKS);

    match state.books().find_one(id).await.map_err(|e| state.fail(e))? {
        Some(book) => Ok(Json(book)),
        None => {
            tracing::debug!(id, "GET /books/{id}. not found");
            Err(state.reject(ApiError::NotFound(id)))
        }
    }
}

/// POST /books
///
/// The identity is assigned by the store; a body that carries one is
/// rejected.
pub async fn create_book(
    State(state): State<AppState>,
    BookBody(book): BookBody,
) -> Result<Response, ApiError> {
    tracing::info!("POST /books");
    state.metrics().increment(BOOKS);

    if book.id.is_some() {
        tracing::debug!("POST /books. Id specified");
        return Err(state.reject(ApiError::BadInput(
            "Id should not be specified".to_string(),
        )));
    }

    let saved = state.books().save(book).await.map_err(|e| state.fail(e))?;
    tracing::debug!(id = ?saved.id, "POST /books. Book created");

    Ok(created(&saved))
}

/// PUT /books
///
/// Without an identity the book is created (201); with one, the record at
/// that identity is replaced (204).
pub async fn replace_book(
    State(state): State<AppState>,
    BookBody(book): BookBody,
) -> Result<Response, ApiError> {
    tracing::info!("PUT /books");
    state.metrics().increment(BOOKS);

    let replacing = book.is_persisted();
    let saved = state.books().save(book).await.map_err(|e| state.fail(e))?;
    tracing::debug!(id = ?saved.id, replacing, "PUT /books. Book saved");

    if replacing {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(created(&saved))
    }
}

/// PATCH /books/{id}
///
/// Applies a merge-patch body. The book is loaded first, so a missing book is
/// reported as 404 whatever the body contains. The write only lands if the
/// book still exists.
pub async fn patch_book(
    State(state): State<AppState>,
    BookId(id): BookId,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    tracing::info!("PATCH /books/{id}");
    state.metrics().increment(BOOKS);

    let Some(book) = state.books().find_one(id).await.map_err(|e| state.fail(e))? else {
        tracing::debug!(id, "PATCH /books/{id}. not found");
        return Err(state.reject(ApiError::NotFound(id)));
    };

    let patch = resolve(&body).map_err(|e| {
        tracing::debug!(id, error = %e, "PATCH /books/{id}. invalid patch");
        state.reject(e.into())
    })?;

    let updated = state
        .books()
        .update(patch.apply(book))
        .await
        .map_err(|e| state.fail(e))?;
    if updated.is_none() {
        tracing::debug!(id, "PATCH /books/{id}. deleted while patching");
        return Err(state.reject(ApiError::NotFound(id)));
    }
    tracing::debug!(id, "PATCH /books/{id}. Book updated");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /books/{id}
pub async fn delete_book(
    State(state): State<AppState>,
    BookId(id): BookId,
) -> Result<StatusCode, ApiError> {
    tracing::info!("DELETE /books/{id}");
    state.metrics().increment(BOOKS);

    if !state.books().exists(id).await.map_err(|e| state.fail(e))? {
        tracing::debug!(id, "DELETE /books/{id}. not found");
        return Err(state.reject(ApiError::NotFound(id)));
    }

    state.books().delete(id).await.map_err(|e| state.fail(e))?;
    tracing::debug!(id, "DELETE /books/{id}. Book deleted");

    Ok(StatusCode::NO_CONTENT)
}
