//! Webhook payload signing
//!
//! Produces a compact HS256 token over the event data with issued-at and
//! a fixed 24-hour expiry. One process-wide secret signs for every
//! subscriber; per-retailer keys are reserved for a later scheme.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use prodomatix_common::{Error, Result};
use serde_json::Value;

/// Signed token validity window
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Signs webhook payloads with the process-wide syndication secret
pub struct PayloadSigner {
    encoding_key: EncodingKey,
}

impl PayloadSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign an event data object, binding it to the validity window
    ///
    /// The platform never verifies these tokens itself; receiving
    /// retailers are expected to.
    pub fn sign(&self, data: &Value) -> Result<String> {
        let mut claims = match data {
            Value::Object(map) => map.clone(),
            other => {
                // Non-object payloads are nested so claims stay a JSON object
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other.clone());
                map
            }
        };

        let now = Utc::now().timestamp();
        claims.insert("iat".to_string(), Value::from(now));
        claims.insert("exp".to_string(), Value::from(now + TOKEN_TTL_SECS));

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("Failed to sign payload: {}", e)))
    }
}
