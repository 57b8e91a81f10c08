//! Verified-buyer purchase check
//!
//! Advisory only: a lookup failure is treated as "not verified" rather
//! than blocking the submission.

use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::db;

/// Check whether the reviewer's email matches a completed order for the
/// product. Callers must skip the call entirely when no email was given.
pub async fn verify_purchase(pool: &SqlitePool, email: &str, product_id: Uuid) -> bool {
    match db::orders::has_completed_order(pool, email, product_id).await {
        Ok(verified) => verified,
        Err(e) => {
            warn!("Purchase verification lookup failed (treating as unverified): {}", e);
            false
        }
    }
}
