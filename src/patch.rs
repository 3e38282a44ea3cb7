//! Merge-patch resolution for partial book updates.
//!
//! A PATCH body is a flat JSON object. Each known field may be absent (leave
//! the stored value alone), `null` (clear it) or a string (replace it). Any
//! other JSON type in a known field rejects the whole document. The identity
//! field may never appear.
//!
//! Resolution happens in one typed pass: [`FieldPatch`] carries the three
//! states, so callers never re-inspect raw JSON.
//!
//! # Example
//!
//! ```
//! use bookapi::{Book, FieldPatch, resolve};
//!
//! let patch = resolve(br#"{"title": null, "author": "Robert C. Martin"}"#).unwrap();
//! assert_eq!(patch.title, FieldPatch::Clear);
//! assert_eq!(patch.edition, FieldPatch::Unchanged);
//!
//! let book = patch.apply(Book::titled("Clean Code").with_id(3));
//! assert_eq!(book.id, Some(3));
//! assert_eq!(book.title, None);
//! assert_eq!(book.author.as_deref(), Some("Robert C. Martin"));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Book;

/// JSON key of the identity field, which a patch must not contain.
pub const IDENTITY_FIELD: &str = "id";

/// Why a patch document could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The body is not a JSON object, or a known field has the wrong type.
    #[error("invalid patch document: {0}")]
    BadInput(String),

    /// The document tries to set the identity field.
    #[error("patch document must not contain '{IDENTITY_FIELD}'")]
    IdentityConflict,
}

/// Directive for a single field of a merge patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Field absent from the document: keep the current value.
    Unchanged,
    /// Field explicitly `null`: remove the current value.
    Clear,
    /// Field present with a value: replace the current value.
    SetTo(T),
}

impl<T> Default for FieldPatch<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> FieldPatch<T> {
    /// Returns true for [`FieldPatch::Unchanged`].
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Apply this directive to a stored value.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Self::Unchanged => {}
            Self::Clear => *slot = None,
            Self::SetTo(value) => *slot = Some(value),
        }
    }
}

impl<T> From<Option<T>> for FieldPatch<T> {
    /// `None` clears, `Some` sets. There is no way to express `Unchanged`
    /// from an `Option`; use `FieldPatch::default()` for that.
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::SetTo)
    }
}

// Only called for keys present in the document; absent keys fall back to
// `Default` through `#[serde(default)]` on the containing struct.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldPatch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Serialize> Serialize for FieldPatch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::SetTo(value) => value.serialize(serializer),
            Self::Unchanged | Self::Clear => serializer.serialize_none(),
        }
    }
}

/// Resolved directives for every mutable field of a [`Book`].
///
/// Serializing a `BookPatch` produces the merge-patch document that resolves
/// back to it: unchanged fields are omitted and cleared fields are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    /// Directive for `title`.
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub title: FieldPatch<String>,

    /// Directive for `author`.
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub author: FieldPatch<String>,

    /// Directive for `edition`.
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub edition: FieldPatch<String>,
}

impl BookPatch {
    /// A patch that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `title` directive.
    #[must_use]
    pub fn title(mut self, directive: impl Into<FieldPatch<String>>) -> Self {
        self.title = directive.into();
        self
    }

    /// Set the `author` directive.
    #[must_use]
    pub fn author(mut self, directive: impl Into<FieldPatch<String>>) -> Self {
        self.author = directive.into();
        self
    }

    /// Set the `edition` directive.
    #[must_use]
    pub fn edition(mut self, directive: impl Into<FieldPatch<String>>) -> Self {
        self.edition = directive.into();
        self
    }

    /// Returns true if every directive is [`FieldPatch::Unchanged`].
    pub fn is_empty(&self) -> bool {
        self.title.is_unchanged() && self.author.is_unchanged() && self.edition.is_unchanged()
    }

    /// Apply the directives to a book, field by field.
    ///
    /// The identity is carried over untouched.
    pub fn apply(self, mut book: Book) -> Book {
        self.title.apply_to(&mut book.title);
        self.author.apply_to(&mut book.author);
        self.edition.apply_to(&mut book.edition);
        book
    }
}

impl From<String> for FieldPatch<String> {
    fn from(value: String) -> Self {
        Self::SetTo(value)
    }
}

impl From<&str> for FieldPatch<String> {
    fn from(value: &str) -> Self {
        Self::SetTo(value.to_string())
    }
}

/// Resolve a raw merge-patch body into per-field directives.
///
/// Unknown keys are ignored.
///
/// # Errors
///
/// - [`ResolveError::IdentityConflict`] if the object has an `id` key, with
///   any value, whatever the state of the other fields.
/// - [`ResolveError::BadInput`] if the body is not a JSON object or a known
///   field holds something other than a string or `null`.
pub fn resolve(raw: &[u8]) -> Result<BookPatch, ResolveError> {
    let object: Map<String, Value> =
        serde_json::from_slice(raw).map_err(|e| ResolveError::BadInput(e.to_string()))?;

    if object.contains_key(IDENTITY_FIELD) {
        return Err(ResolveError::IdentityConflict);
    }

    BookPatch::deserialize(Value::Object(object)).map_err(|e| ResolveError::BadInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Book {
        Book::titled("The DevOps Handbook")
            .with_author("Gene Kim")
            .with_edition("2nd")
            .with_id(7)
    }

    #[test]
    fn test_absent_fields_are_unchanged() {
        let patch = resolve(b"{}").unwrap();

        assert!(patch.is_empty());
        assert_eq!(patch.apply(stored()), stored());
    }

    #[test]
    fn test_null_clears_only_that_field() {
        for field in ["title", "author", "edition"] {
            let body = format!(r#"{{"{field}": null}}"#);
            let book = resolve(body.as_bytes()).unwrap().apply(stored());

            let mut expected = stored();
            match field {
                "title" => expected.title = None,
                "author" => expected.author = None,
                _ => expected.edition = None,
            }
            assert_eq!(book, expected, "clearing {field}");
        }
    }

    #[test]
    fn test_string_sets_value() {
        let patch = resolve(br#"{"edition": "3rd", "author": ""}"#).unwrap();

        assert_eq!(patch.edition, FieldPatch::SetTo("3rd".to_string()));
        let book = patch.apply(stored());
        assert_eq!(book.edition.as_deref(), Some("3rd"));
        assert_eq!(book.author.as_deref(), Some(""));
        assert_eq!(book.title.as_deref(), Some("The DevOps Handbook"));
    }

    #[test]
    fn test_wrong_type_rejects_whole_patch() {
        let bodies: [&[u8]; 5] = [
            br#"{"title": "ok", "author": 5}"#,
            br#"{"title": true}"#,
            br#"{"edition": ["1st"]}"#,
            br#"{"author": {"name": "x"}, "title": null}"#,
            br#"{"title": 1.5}"#,
        ];

        for body in bodies {
            let result = resolve(body);
            assert!(
                matches!(result, Err(ResolveError::BadInput(_))),
                "expected bad input for {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_identity_key_always_conflicts() {
        let bodies: [&[u8]; 4] = [
            br#"{"id": 5}"#,
            br#"{"id": null}"#,
            br#"{"title": "fine", "id": "5"}"#,
            br#"{"title": 42, "id": 5}"#,
        ];

        for body in bodies {
            assert_eq!(resolve(body), Err(ResolveError::IdentityConflict));
        }
    }

    #[test]
    fn test_non_object_body_is_bad_input() {
        let bodies: [&[u8]; 5] = [b"", b"not json", b"[]", br#""title""#, b"null"];

        for body in bodies {
            assert!(matches!(resolve(body), Err(ResolveError::BadInput(_))));
        }
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let patch = resolve(br#"{"isbn": 12345, "title": "New"}"#).unwrap();

        assert_eq!(patch, BookPatch::new().title("New"));
    }

    #[test]
    fn test_apply_never_touches_identity() {
        let patch = BookPatch::new().title(None).author(None).edition(None);
        let book = patch.apply(stored());

        assert_eq!(book.id, Some(7));
        assert_eq!(book, Book::default().with_id(7));
    }

    #[test]
    fn test_patch_serializes_to_merge_document() {
        let patch = BookPatch::new().title("A").edition(None);
        let json = serde_json::to_value(&patch).unwrap();

        assert_eq!(json, serde_json::json!({"title": "A", "edition": null}));
        assert_eq!(resolve(json.to_string().as_bytes()).unwrap(), patch);
    }
}
