//! Persistence for books.
//!
//! The API talks to storage only through [`BookRepository`]. Every operation
//! can fail with a [`StoreError`]; constraint breaches come back as the typed
//! [`StoreError::Constraint`] variant, while failures from deeper layers are
//! wrapped with their cause chain intact so the API can classify them.

mod memory;

use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;

use crate::Book;

pub use memory::InMemoryBookStore;

/// Boxed lower-layer failure carried inside a [`StoreError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A data-integrity rule enforced by the store was broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("constraint '{constraint}' violated: {message}")]
pub struct ConstraintViolation {
    /// Name of the broken rule.
    pub constraint: &'static str,
    /// What the write tried to do.
    pub message: String,
}

/// Errors returned by a [`BookRepository`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write was rejected by a store-level rule.
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    /// A write was rolled back because a lower layer failed.
    #[error("transaction rolled back")]
    RolledBack {
        /// Why the transaction was rolled back.
        #[source]
        source: BoxError,
    },

    /// Every identity has been handed out.
    #[error("no identities left to assign")]
    IdentitiesExhausted,

    /// The store could not be reached or is otherwise broken.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Wrap a lower-layer failure as a rolled-back transaction.
    pub fn rolled_back(source: impl Into<BoxError>) -> Self {
        Self::RolledBack {
            source: source.into(),
        }
    }

    /// Returns true for the typed constraint variant.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = core::result::Result<T, StoreError>;

/// Storage for books.
///
/// Implementations own identity assignment: saving a book without an `id`
/// inserts it under a fresh identity, saving one with an `id` inserts or
/// replaces the record at that identity.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All stored books, ordered by identity.
    async fn find_all(&self) -> StoreResult<Vec<Book>>;

    /// The book with the given identity, if any.
    async fn find_one(&self, id: u64) -> StoreResult<Option<Book>>;

    /// Whether a book with the given identity exists.
    async fn exists(&self, id: u64) -> StoreResult<bool>;

    /// Insert or replace a book and return it as stored.
    async fn save(&self, book: Book) -> StoreResult<Book>;

    /// Replace the book at `book.id` only if it is still stored.
    ///
    /// Returns `None` when there is no such book, including when it was
    /// deleted after being read. A book without an identity is never stored.
    async fn update(&self, book: Book) -> StoreResult<Option<Book>>;

    /// Remove the book with the given identity. Removing a missing book is a
    /// no-op.
    async fn delete(&self, id: u64) -> StoreResult<()>;

    /// Number of stored books.
    async fn count(&self) -> StoreResult<usize>;
}
