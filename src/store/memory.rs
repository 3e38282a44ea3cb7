//! In-memory book store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookRepository, ConstraintViolation, StoreError, StoreResult};
use crate::Book;

/// Name of the rule that keeps `(title, author, edition)` unique.
pub const UNIQUE_EDITION: &str = "book_unique_edition";

/// Records and the identity sequence.
///
/// `next_id` is above every stored identity; `None` once `u64::MAX` is taken.
#[derive(Debug)]
struct StoreState {
    books: BTreeMap<u64, Book>,
    next_id: Option<u64>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            books: BTreeMap::new(),
            next_id: Some(1),
        }
    }
}

impl StoreState {
    fn check_unique(&self, book: &Book) -> StoreResult<()> {
        match self.duplicate_of(book) {
            Some(existing) => Err(ConstraintViolation {
                constraint: UNIQUE_EDITION,
                message: format!("same title, author and edition as book {existing}"),
            }
            .into()),
            None => Ok(()),
        }
    }

    fn fresh_id(&self) -> StoreResult<u64> {
        match self.next_id {
            Some(id) if !self.books.contains_key(&id) => Ok(id),
            _ => Err(StoreError::IdentitiesExhausted),
        }
    }

    fn insert(&mut self, id: u64, mut book: Book) -> Book {
        self.next_id = match (self.next_id, id.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        book.id = Some(id);
        self.books.insert(id, book.clone());
        tracing::trace!(id, "book saved");
        book
    }

    fn duplicate_of(&self, book: &Book) -> Option<u64> {
        book.title.as_ref()?;
        self.books
            .values()
            .find(|other| {
                other.id != book.id
                    && other.title == book.title
                    && other.author == book.author
                    && other.edition == book.edition
            })
            .and_then(|other| other.id)
    }
}

/// A [`BookRepository`] held in process memory.
///
/// Cheap to clone; clones share the same records. Identities start at 1 and
/// are never reused, even after deletes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryBookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given books.
    ///
    /// Books without an identity are assigned one in order.
    ///
    /// # Errors
    ///
    /// Returns the first save failure.
    pub async fn with_books(books: impl IntoIterator<Item = Book>) -> StoreResult<Self> {
        let store = Self::new();
        for book in books {
            store.save(book).await?;
        }
        Ok(store)
    }
}

#[async_trait]
impl BookRepository for InMemoryBookStore {
    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        Ok(self.state.read().await.books.values().cloned().collect())
    }

    async fn find_one(&self, id: u64) -> StoreResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn exists(&self, id: u64) -> StoreResult<bool> {
        Ok(self.state.read().await.books.contains_key(&id))
    }

    async fn save(&self, book: Book) -> StoreResult<Book> {
        book.validate().map_err(StoreError::rolled_back)?;

        let mut state = self.state.write().await;
        state.check_unique(&book)?;

        let id = match book.id {
            Some(id) => id,
            None => state.fresh_id()?,
        };
        Ok(state.insert(id, book))
    }

    async fn update(&self, book: Book) -> StoreResult<Option<Book>> {
        let Some(id) = book.id else {
            return Ok(None);
        };
        book.validate().map_err(StoreError::rolled_back)?;

        let mut state = self.state.write().await;
        if !state.books.contains_key(&id) {
            return Ok(None);
        }
        state.check_unique(&book)?;

        Ok(Some(state.insert(id, book)))
    }

    async fn delete(&self, id: u64) -> StoreResult<()> {
        self.state.write().await.books.remove(&id);
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.state.read().await.books.len())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::models::{ValidationError, MAX_FIELD_LEN};

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let store = InMemoryBookStore::new();

        let first = store.save(Book::titled("A")).await.unwrap();
        let second = store.save(Book::titled("B")).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_save_with_id_replaces_and_advances_sequence() {
        let store = InMemoryBookStore::with_books([Book::titled("A")]).await.unwrap();

        store.save(Book::titled("A2").with_id(1)).await.unwrap();
        store.save(Book::titled("Z").with_id(10)).await.unwrap();
        let next = store.save(Book::titled("C")).await.unwrap();

        assert_eq!(
            store.find_one(1).await.unwrap().unwrap().title.as_deref(),
            Some("A2")
        );
        assert_eq!(next.id, Some(11));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = InMemoryBookStore::with_books([Book::titled("A"), Book::titled("B")])
            .await
            .unwrap();

        store.delete(2).await.unwrap();
        assert!(!store.exists(2).await.unwrap());

        let next = store.save(Book::titled("C")).await.unwrap();
        assert_eq!(next.id, Some(3));
    }

    #[tokio::test]
    async fn test_largest_identity_is_never_handed_out_again() {
        let store = InMemoryBookStore::new();
        store
            .save(Book::titled("Existing").with_id(u64::MAX))
            .await
            .unwrap();

        let err = store.save(Book::titled("New")).await.unwrap_err();

        assert!(matches!(err, StoreError::IdentitiesExhausted));
        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title.as_deref(), Some("Existing"));
    }

    #[tokio::test]
    async fn test_replacing_below_the_sequence_keeps_it() {
        let store = InMemoryBookStore::new();
        store.save(Book::titled("Top").with_id(u64::MAX)).await.unwrap();
        store.save(Book::titled("Low").with_id(5)).await.unwrap();

        assert!(store.save(Book::titled("New")).await.is_err());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_existing_book() {
        let store = InMemoryBookStore::with_books([Book::titled("A")]).await.unwrap();

        let updated = store
            .update(Book::titled("A2").with_author("X").with_id(1))
            .await
            .unwrap();

        assert_eq!(updated.and_then(|b| b.author), Some("X".to_string()));
        assert_eq!(
            store.find_one(1).await.unwrap().unwrap().title.as_deref(),
            Some("A2")
        );
    }

    #[tokio::test]
    async fn test_update_does_not_resurrect_deleted_book() {
        let store = InMemoryBookStore::with_books([Book::titled("A")]).await.unwrap();
        let loaded = store.find_one(1).await.unwrap().unwrap();

        store.delete(1).await.unwrap();
        let updated = store.update(loaded).await.unwrap();

        assert!(updated.is_none());
        assert!(!store.exists(1).await.unwrap());
        assert!(store.update(Book::titled("No id")).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_checks_uniqueness() {
        let store = InMemoryBookStore::with_books([Book::titled("A"), Book::titled("B")])
            .await
            .unwrap();

        let err = store.update(Book::titled("A").with_id(2)).await.unwrap_err();

        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_duplicate_edition_is_typed_constraint() {
        let store = InMemoryBookStore::with_books([Book::titled("A").with_author("X")])
            .await
            .unwrap();

        let err = store
            .save(Book::titled("A").with_author("X"))
            .await
            .unwrap_err();

        assert!(err.is_constraint_violation());
        assert!(err.to_string().contains(UNIQUE_EDITION));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resaving_same_record_is_not_a_duplicate() {
        let store = InMemoryBookStore::with_books([Book::titled("A")]).await.unwrap();

        let saved = store.save(Book::titled("A").with_id(1)).await;
        assert!(saved.is_ok());
    }

    #[tokio::test]
    async fn test_untitled_books_are_never_duplicates() {
        let store = InMemoryBookStore::new();

        store.save(Book::default()).await.unwrap();
        store.save(Book::default()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_validation_failure_is_wrapped_in_rollback() {
        let store = InMemoryBookStore::new();

        let err = store
            .save(Book::titled("x".repeat(MAX_FIELD_LEN + 1)))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::RolledBack { .. }));
        let cause = err.source().unwrap();
        assert!(cause.downcast_ref::<ValidationError>().is_some());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
