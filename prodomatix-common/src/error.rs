//! Shared error type for the Prodomatix service crates
//!
//! Deliberately small: only the failure classes that cross crate
//! boundaries live here. Request-level errors with HTTP semantics are
//! defined by each service on top of this.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failures, mainly database path preparation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read, parsed, or applied
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything that should never surface to a caller as-is
    #[error("Internal error: {0}")]
    Internal(String),
}
