//! HTTP request handlers for the book API.

pub mod books;
pub mod greeting;

pub use books::*;
pub use greeting::*;
