//! Retailer (syndication subscriber) type

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A retail partner subscribed to review syndication
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Retailer {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    /// Static secret authenticating pull access to the syndication API
    pub api_key: Option<String>,
    /// Presence means the retailer is subscribed to push delivery
    pub webhook_url: Option<String>,
    /// Reserved for per-subscriber signing keys; the current signer uses
    /// the process-wide secret instead
    pub webhook_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
