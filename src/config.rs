//! Server configuration.
//!
//! The binary fills [`ServerConfig`] from command-line flags, which fall back
//! to the same environment variables [`ServerConfig::from_env`] reads:
//!
//! - `BOOKS_BIND_ADDR` - address the API listens on (default `127.0.0.1:8080`)
//! - `BOOKS_METRICS_ADDR` - address for the Prometheus exporter (default: disabled)
//! - `BOOKS_SEED` - load seed books into an empty store (default `true`)

use std::env;
use std::net::{Ipv4Addr, SocketAddr};

use crate::error::{BookError, Result};

/// Environment variable for [`ServerConfig::bind_addr`].
pub const BIND_ADDR_ENV: &str = "BOOKS_BIND_ADDR";
/// Environment variable for [`ServerConfig::metrics_addr`].
pub const METRICS_ADDR_ENV: &str = "BOOKS_METRICS_ADDR";
/// Environment variable for [`ServerConfig::seed`].
pub const SEED_ENV: &str = "BOOKS_SEED";

/// Default port for the book API.
pub const DEFAULT_PORT: u16 = 8080;

/// Book API server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the API listens on.
    pub bind_addr: SocketAddr,
    /// Address the Prometheus exporter listens on, if enabled.
    pub metrics_addr: Option<SocketAddr>,
    /// Whether to seed an empty store with sample books.
    pub seed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            metrics_addr: None,
            seed: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, using defaults for
    /// anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = match lookup(BIND_ADDR_ENV) {
            Some(value) => parse_addr(BIND_ADDR_ENV, &value)?,
            None => defaults.bind_addr,
        };

        let metrics_addr = lookup(METRICS_ADDR_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(|value| parse_addr(METRICS_ADDR_ENV, &value))
            .transpose()?;

        let seed = match lookup(SEED_ENV) {
            Some(value) => parse_bool(SEED_ENV, &value)?,
            None => defaults.seed,
        };

        Ok(Self {
            bind_addr,
            metrics_addr,
            seed,
        })
    }
}

fn parse_addr(key: &str, value: &str) -> Result<SocketAddr> {
    value
        .trim()
        .parse()
        .map_err(|e| BookError::Config(format!("{key}={value:?}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BookError::Config(format!(
            "{key}={value:?}: expected true or false"
        ))),
    }
}
