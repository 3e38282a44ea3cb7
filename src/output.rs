//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::Book;

/// Trait for human-readable key-value output.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Book {
    fn pretty_print(&self) -> String {
        let header = match self.id {
            Some(id) => format!("Book #{id}"),
            None => "Book (unsaved)".to_string(),
        };
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        let fields = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Edition", &self.edition),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                lines.push(format!("{:<16}{}", format!("{label}:"), value));
            }
        }

        lines.join("\n")
    }
}
