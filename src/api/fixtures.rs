//! Seed data for a fresh store.

use crate::store::{BookRepository, StoreResult};
use crate::Book;

/// Collection of book fixtures.
pub struct Fixtures;

impl Fixtures {
    /// The books a new server starts with.
    pub fn default_books() -> Vec<Book> {
        vec![
            Book::titled("The Phoenix Project")
                .with_author("Gene Kim, Kevin Behr, George Spafford")
                .with_edition("5th Anniversary edition"),
            Book::titled("The DevOps Handbook")
                .with_author("Gene Kim, Jez Humble, Patrick Debois, and John Willis"),
            Book::titled("Clean Code").with_author("Robert C. Martin"),
        ]
    }

    /// Save [`Fixtures::default_books`] if the store is empty.
    ///
    /// Returns how many books were inserted.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn seed(books: &dyn BookRepository) -> StoreResult<usize> {
        if books.count().await? > 0 {
            tracing::debug!("store not empty, skipping seed data");
            return Ok(0);
        }

        let fixtures = Self::default_books();
        let inserted = fixtures.len();
        for book in fixtures {
            books.save(book).await?;
        }

        tracing::info!(inserted, "seeded book store");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryBookStore;

    #[tokio::test]
    async fn test_seed_fills_empty_store() {
        let store = InMemoryBookStore::new();

        let inserted = Fixtures::seed(&store).await.unwrap();

        assert_eq!(inserted, 3);
        let books = store.find_all().await.unwrap();
        assert_eq!(books[2].title.as_deref(), Some("Clean Code"));
        assert!(books[1].edition.is_none());
    }

    #[tokio::test]
    async fn test_seed_leaves_existing_data_alone() {
        let store = InMemoryBookStore::with_books([Book::titled("Mine")])
            .await
            .unwrap();

        assert_eq!(Fixtures::seed(&store).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[test]
    fn test_default_books_are_valid() {
        for book in Fixtures::default_books() {
            assert!(book.validate().is_ok());
            assert!(!book.is_persisted());
        }
    }
}
