//! Book model and field validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length, in characters, of any text field on a book.
pub const MAX_FIELD_LEN: usize = 255;

/// A book record.
///
/// The `id` is assigned by the store when the book is first saved and never
/// changes afterwards. Every other field is optional text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identity. `None` until the book has been saved.
    #[serde(default)]
    pub id: Option<u64>,

    /// The book title.
    #[serde(default)]
    pub title: Option<String>,

    /// The book author(s).
    #[serde(default)]
    pub author: Option<String>,

    /// Which edition the book is.
    #[serde(default)]
    pub edition: Option<String>,
}

impl Book {
    /// Create an unsaved book with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Set the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the edition.
    #[must_use]
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    /// Set the identity.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether the book has been saved.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Check the field constraints.
    ///
    /// # Errors
    ///
    /// Returns every violated field rule, not just the first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let violations: Vec<FieldViolation> = [
            ("title", &self.title),
            ("author", &self.author),
            ("edition", &self.edition),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            let len = value.as_deref().map(|v| v.chars().count())?;
            (len > MAX_FIELD_LEN).then(|| FieldViolation {
                field,
                message: format!("length {len} exceeds maximum of {MAX_FIELD_LEN}"),
            })
        })
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}

/// A single broken field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field.
    pub field: &'static str,
    /// What was wrong with it.
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// One or more field rules were broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", .violations.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    /// The broken rules.
    pub violations: Vec<FieldViolation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_serializes_missing_fields_as_null() {
        let json = serde_json::to_value(Book::titled("A").with_id(1)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 1, "title": "A", "author": null, "edition": null})
        );
    }

    #[test]
    fn test_book_deserializes_partial_object() {
        let book: Book = serde_json::from_str(r#"{"title": "Clean Code"}"#).unwrap();

        assert_eq!(book.id, None);
        assert_eq!(book.title.as_deref(), Some("Clean Code"));
        assert!(book.author.is_none());
        assert!(!book.is_persisted());
    }

    #[test]
    fn test_validate_accepts_field_at_limit() {
        let book = Book::titled("x".repeat(MAX_FIELD_LEN));
        assert!(book.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_long_field() {
        let long = "x".repeat(MAX_FIELD_LEN + 1);
        let book = Book::titled(long.clone()).with_edition(long);

        let err = book.validate().unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["title", "edition"]);
        assert!(err.to_string().starts_with("validation failed: title: length 256"));
    }
}
