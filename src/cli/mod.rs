//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the bookapi binary.

use std::net::SocketAddr;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::BookClient;
use crate::config::ServerConfig;
use crate::error::{BookError, Result};
use crate::patch::{BookPatch, FieldPatch};
use crate::Book;

/// Book API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "bookapi", about = "Book record API server and client", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Base URL of the book API for client commands [default: $BOOKS_API_URL,
    /// then http://127.0.0.1:8080].
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Client for the API at `--url`, or as configured by the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn client(&self) -> Result<BookClient> {
        match &self.url {
            Some(url) => BookClient::new(url),
            None => BookClient::from_env(),
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the book API server.
    Serve(ServeArgs),

    /// List all books.
    List,

    /// Get a single book.
    Get {
        /// Book identity.
        id: u64,
    },

    /// Create a book.
    Create(BookFields),

    /// Replace a book, or create it when no identity is given.
    Replace {
        /// Book identity; omitted to create.
        #[arg(long)]
        id: Option<u64>,

        #[command(flatten)]
        fields: BookFields,
    },

    /// Partially update a book.
    Patch {
        /// Book identity.
        id: u64,

        #[command(flatten)]
        fields: BookFields,

        /// Fields to clear.
        #[arg(long, value_enum)]
        clear: Vec<Field>,
    },

    /// Delete a book.
    Delete {
        /// Book identity.
        id: u64,
    },
}

/// Flags for `serve`. Anything not given falls back to the `BOOKS_*`
/// environment variables read by [`ServerConfig::from_env`].
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeArgs {
    /// Address to listen on [default: $BOOKS_BIND_ADDR, then 127.0.0.1:8080].
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Address for the Prometheus exporter [default: $BOOKS_METRICS_ADDR].
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Load seed books into the empty store (true/false, on/off, yes/no, 1/0)
    /// [default: $BOOKS_SEED, then true].
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub seed: Option<bool>,
}

impl ServeArgs {
    /// Server configuration from the environment, overridden by these flags.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable cannot be parsed.
    pub fn config(&self) -> Result<ServerConfig> {
        Ok(self.override_config(ServerConfig::from_env()?))
    }

    /// Apply the flags that were given on top of `base`.
    pub fn override_config(&self, base: ServerConfig) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind.unwrap_or(base.bind_addr),
            metrics_addr: self.metrics_addr.or(base.metrics_addr),
            seed: self.seed.unwrap_or(base.seed),
        }
    }
}

/// Book fields given as flags.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFields {
    /// Book title.
    #[arg(long)]
    pub title: Option<String>,

    /// Book author.
    #[arg(long)]
    pub author: Option<String>,

    /// Book edition.
    #[arg(long)]
    pub edition: Option<String>,
}

impl BookFields {
    /// Full book representation; unset flags become absent fields.
    pub fn to_book(&self, id: Option<u64>) -> Book {
        Book {
            id,
            title: self.title.clone(),
            author: self.author.clone(),
            edition: self.edition.clone(),
        }
    }

    /// Merge patch that sets the given flags and clears `clear`.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::Config`] if a field is both set and cleared.
    pub fn to_patch(&self, clear: &[Field]) -> Result<BookPatch> {
        let directive = |value: &Option<String>, field: Field| match (value, clear.contains(&field)) {
            (Some(_), true) => Err(BookError::Config(format!(
                "--{0} and --clear {0} cannot be combined",
                field.name()
            ))),
            (Some(value), false) => Ok(FieldPatch::SetTo(value.clone())),
            (None, true) => Ok(FieldPatch::Clear),
            (None, false) => Ok(FieldPatch::Unchanged),
        };

        Ok(BookPatch::new()
            .title(directive(&self.title, Field::Title)?)
            .author(directive(&self.author, Field::Author)?)
            .edition(directive(&self.edition, Field::Edition)?))
    }
}

/// Book fields that can be cleared.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// The title.
    Title,
    /// The author.
    Author,
    /// The edition.
    Edition,
}

impl Field {
    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Edition => "edition",
        }
    }
}
