//! HTTP surface of the book API.
//!
//! | Method | Path          | Success                     |
//! |--------|---------------|-----------------------------|
//! | GET    | `/`           | 200 greeting page           |
//! | GET    | `/books`      | 200 all books               |
//! | POST   | `/books`      | 201 + `Location`            |
//! | PUT    | `/books`      | 201 + `Location`, or 204    |
//! | GET    | `/books/{id}` | 200 the book                |
//! | PATCH  | `/books/{id}` | 204                         |
//! | DELETE | `/books/{id}` | 204                         |
//! | GET    | `/health`     | 200 `ok`                    |
//!
//! Failures are JSON bodies of the shape `{"error": CODE, "message": ...}`;
//! see [`ApiError`].

mod error;
mod extract;
mod fixtures;
pub mod handlers;
mod server;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use extract::{BookBody, BookId};
pub use fixtures::Fixtures;
pub use server::{router, run, BookServer};
pub use state::AppState;
