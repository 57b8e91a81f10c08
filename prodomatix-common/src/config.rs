//! Configuration loading for Prodomatix services
//!
//! Resolution priority for every field: environment variable, then TOML
//! config file, then built-in default. Classifier API keys are optional;
//! running without them degrades moderation to the local fallback path
//! rather than failing startup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default signing secret, matching the documented placeholder. A warning
/// is emitted when the deployment has not overridden it.
pub const DEFAULT_SYNDICATION_SECRET: &str = "default-secret-change-me";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";
const DEFAULT_DATABASE_PATH: &str = "prodomatix.db";

/// On-disk TOML configuration (all fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to (e.g. "127.0.0.1:5780")
    pub bind_address: Option<String>,
    /// Path to the SQLite database file
    pub database_path: Option<String>,
    /// Process-wide secret used to sign webhook payloads
    pub syndication_secret: Option<String>,
    /// API key for the safety classifier (absent = stage skipped)
    pub safety_api_key: Option<String>,
    /// API key for the reasoning classifier (absent = local fallback)
    pub reasoning_api_key: Option<String>,
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub syndication_secret: String,
    pub safety_api_key: Option<String>,
    pub reasoning_api_key: Option<String>,
}

impl ServiceConfig {
    /// Resolve configuration from environment and TOML
    ///
    /// The config file path comes from `PRODOMATIX_CONFIG`; if unset,
    /// `prodomatix.toml` in the working directory is used when present.
    /// Individual `PRODOMATIX_*` environment variables override TOML
    /// values field by field.
    pub fn resolve() -> Result<Self> {
        let toml_config = match std::env::var("PRODOMATIX_CONFIG") {
            Ok(path) => load_toml_config(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new("prodomatix.toml");
                if default_path.exists() {
                    load_toml_config(default_path)?
                } else {
                    TomlConfig::default()
                }
            }
        };

        Ok(Self::from_sources(&toml_config))
    }

    /// Merge environment variables over a parsed TOML config
    pub fn from_sources(toml_config: &TomlConfig) -> Self {
        let bind_address = resolve_field("PRODOMATIX_BIND_ADDRESS", &toml_config.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let database_path = resolve_field("PRODOMATIX_DATABASE_PATH", &toml_config.database_path)
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let syndication_secret = resolve_field(
            "PRODOMATIX_SYNDICATION_SECRET",
            &toml_config.syndication_secret,
        )
        .unwrap_or_else(|| {
            warn!("Syndication signing secret not configured; using built-in default");
            DEFAULT_SYNDICATION_SECRET.to_string()
        });

        let safety_api_key = resolve_field("PRODOMATIX_SAFETY_API_KEY", &toml_config.safety_api_key);
        let reasoning_api_key =
            resolve_field("PRODOMATIX_REASONING_API_KEY", &toml_config.reasoning_api_key);

        Self {
            bind_address,
            database_path: PathBuf::from(database_path),
            syndication_secret,
            safety_api_key,
            reasoning_api_key,
        }
    }
}

/// Resolve one field: environment variable wins over TOML. Blank values
/// are treated as unset.
fn resolve_field(env_var: &str, toml_value: &Option<String>) -> Option<String> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }

    toml_value
        .as_ref()
        .filter(|v| !v.trim().is_empty())
        .cloned()
}
