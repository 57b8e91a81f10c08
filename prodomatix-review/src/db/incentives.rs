//! Incentive database operations

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use prodomatix_common::Result;

use crate::db::{parse_timestamp, parse_uuid};
use crate::models::Incentive;

/// Find an active incentive applicable to the product
///
/// A product-scoped incentive wins over a global (NULL product_id) one.
pub async fn find_active_for_product(
    pool: &SqlitePool,
    product_id: Uuid,
) -> Result<Option<Incentive>> {
    let row = sqlx::query(
        r#"
        SELECT id, code, description, is_active, product_id, created_at
        FROM incentives
        WHERE is_active = 1 AND (product_id = ? OR product_id IS NULL)
        ORDER BY CASE WHEN product_id IS NULL THEN 1 ELSE 0 END, created_at DESC
        LIMIT 1
        "#,
    )
    .bind(product_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let id: String = row.get("id");
            let incentive_product: Option<String> = row.get("product_id");
            let created_at: String = row.get("created_at");

            Ok(Some(Incentive {
                id: parse_uuid("incentives.id", &id)?,
                code: row.get("code"),
                description: row.get("description"),
                is_active: row.get("is_active"),
                product_id: incentive_product
                    .map(|v| parse_uuid("incentives.product_id", &v))
                    .transpose()?,
                created_at: parse_timestamp("incentives.created_at", &created_at)?,
            }))
        }
        None => Ok(None),
    }
}
