//! Incentive (discount code) type

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A discount code offered in exchange for a review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Incentive {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub is_active: bool,
    /// None applies the incentive to every product
    pub product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
