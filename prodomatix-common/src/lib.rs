//! Shared types for the Prodomatix services
//!
//! Carries the error taxonomy and configuration loading used by the
//! review ingestion/syndication service.

pub mod config;
pub mod error;

pub use error::{Error, Result};
