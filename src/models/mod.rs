//! Book API model types.

mod book;

pub use book::*;
