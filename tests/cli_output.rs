//! Tests for CLI output formatting.

use bookapi::{Book, PrettyPrint};

fn make_test_book() -> Book {
    Book::titled("The Phoenix Project")
        .with_author("Gene Kim, Kevin Behr, George Spafford")
        .with_edition("5th Anniversary edition")
        .with_id(1)
}

// ============================================================================
// JSON Output Tests
// ============================================================================

#[test]
fn test_json_output_keeps_every_field() {
    let json_output = serde_json::to_string_pretty(&Book::titled("A").with_id(2)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json_output).unwrap();

    assert_eq!(parsed["id"], 2);
    assert_eq!(parsed["title"], "A");
    assert!(parsed["author"].is_null());
    assert!(parsed["edition"].is_null());
}

#[test]
fn test_json_for_list_outputs_array() {
    let books = vec![make_test_book(), make_test_book()];
    let json_output = serde_json::to_string_pretty(&books).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&json_output).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
}

// ============================================================================
// Pretty-Print Tests
// ============================================================================

#[test]
fn test_pretty_print_is_not_json() {
    let output = make_test_book().pretty_print();

    assert!(!output.starts_with('{'));
    assert!(serde_json::from_str::<serde_json::Value>(&output).is_err());
}

#[test]
fn test_pretty_print_lists_fields_in_order() {
    let output = make_test_book().pretty_print();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], "Book #1");
    assert!(lines[1].starts_with('─'));
    assert!(lines[2].starts_with("Title:"));
    assert!(lines[3].starts_with("Author:"));
    assert!(lines[4].ends_with("5th Anniversary edition"));
}
