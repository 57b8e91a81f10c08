//! Order lookups (read-only reference data)
//!
//! The core never writes orders; they come from the store integration.

use sqlx::SqlitePool;
use uuid::Uuid;

use prodomatix_common::Result;

/// Check whether a completed order exists for this email and product
pub async fn has_completed_order(
    pool: &SqlitePool,
    customer_email: &str,
    product_id: Uuid,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM orders
        WHERE customer_email = ? AND product_id = ? AND status = 'completed'
        "#,
    )
    .bind(customer_email)
    .bind(product_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}
