//! Product types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product owned by a brand
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    /// Brand management is external; the column is carried for ownership
    pub brand_id: Option<Uuid>,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Cached pros/cons/verdict JSON, written only by the summary regenerator
    pub ai_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate review summary generated for a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub verdict: String,
}
