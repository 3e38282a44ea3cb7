//! Book API client.
//!
//! Typed HTTP client for the `/books` endpoints, used by the CLI and by the
//! end-to-end tests.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::error::{BookError, Result};
use crate::patch::BookPatch;
use crate::Book;

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "BOOKS_API_URL";
/// Base URL used when [`API_URL_ENV`] is unset.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
const USER_AGENT: &str = concat!("bookapi/", env!("CARGO_PKG_VERSION"));

/// What a `PUT /books` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The book had no identity and was created under this one.
    Created(u64),
    /// The book at the given identity was replaced.
    Replaced,
}

/// Client for the book API.
///
/// Cheaply cloneable; clones share the same connection pool.
///
/// # Example
///
/// ```no_run
/// use bookapi::{Book, BookClient, BookPatch};
///
/// # async fn example() -> bookapi::Result<()> {
/// let client = BookClient::new("http://127.0.0.1:8080")?;
///
/// let id = client.create(&Book::titled("Dune").with_author("Frank Herbert")).await?;
/// client.patch(id, &BookPatch::default().edition("1st")).await?;
///
/// let book = client.get(id).await?;
/// assert_eq!(book.edition.as_deref(), Some("1st"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BookClient {
    http: Client,
    base_url: Arc<Url>,
}

impl std::fmt::Debug for BookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BookClient {
    /// Create a client from `BOOKS_API_URL`, falling back to
    /// `http://127.0.0.1:8080`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&base_url)
    }

    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let base_url = Url::parse(&base_url_str)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(BookError::HttpError)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch every book.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Book>> {
        let url = self.base_url.join("books")?;
        let response = self.send(self.http.get(url), None).await?;
        Ok(response.json().await?)
    }

    /// Fetch one book.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: u64) -> Result<Book> {
        let url = self.book_url(id)?;
        let response = self.send(self.http.get(url), Some(id)).await?;
        Ok(response.json().await?)
    }

    /// Create a book and return its assigned identity.
    ///
    /// The book must not carry an identity.
    #[tracing::instrument(skip(self, book))]
    pub async fn create(&self, book: &Book) -> Result<u64> {
        let url = self.base_url.join("books")?;
        let response = self.send(self.http.post(url).json(book), None).await?;
        Self::created_id(&response)
    }

    /// Create or replace a book depending on whether it carries an identity.
    #[tracing::instrument(skip(self, book), fields(id = ?book.id))]
    pub async fn replace(&self, book: &Book) -> Result<ReplaceOutcome> {
        let url = self.base_url.join("books")?;
        let response = self.send(self.http.put(url).json(book), book.id).await?;

        if response.status() == StatusCode::CREATED {
            Ok(ReplaceOutcome::Created(Self::created_id(&response)?))
        } else {
            Ok(ReplaceOutcome::Replaced)
        }
    }

    /// Apply a partial update to a book.
    #[tracing::instrument(skip(self, patch))]
    pub async fn patch(&self, id: u64, patch: &BookPatch) -> Result<()> {
        let url = self.book_url(id)?;
        self.send(self.http.patch(url).json(patch), Some(id)).await?;
        Ok(())
    }

    /// Delete a book.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<()> {
        let url = self.book_url(id)?;
        self.send(self.http.delete(url), Some(id)).await?;
        Ok(())
    }

    fn book_url(&self, id: u64) -> Result<Url> {
        Ok(self.base_url.join(&format!("books/{id}"))?)
    }

    async fn send(&self, request: RequestBuilder, id: Option<u64>) -> Result<Response> {
        let response = request.send().await.map_err(BookError::HttpError)?;
        Self::check_response(response, id).await
    }

    /// Identity from the `Location` header of a `201 Created`.
    fn created_id(response: &Response) -> Result<u64> {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| location.rsplit('/').next())
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| BookError::ApiError {
                message: "created response has no usable Location header".to_string(),
                status_code: Some(response.status().as_u16()),
            })
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response, id: Option<u64>) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(BookError::NotFound { id });
        }

        let message = Self::extract_error_message(response, status).await;
        Err(BookError::ApiError {
            message,
            status_code: Some(status.as_u16()),
        })
    }

    /// Extract error message from a failed response.
    async fn extract_error_message(response: Response, status: StatusCode) -> String {
        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => return format!("HTTP {status}"),
        };

        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
                return msg.to_string();
            }
            if let Some(err) = json.get("error").and_then(|m| m.as_str()) {
                return err.to_string();
            }
        }

        if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body
        }
    }
}
