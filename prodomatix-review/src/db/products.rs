//! Product database operations

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use prodomatix_common::Result;

use crate::db::{parse_timestamp, parse_uuid};
use crate::models::Product;

/// Load a product by id
pub async fn get_product(pool: &SqlitePool, product_id: Uuid) -> Result<Option<Product>> {
    let row = sqlx::query(
        r#"
        SELECT id, brand_id, name, sku, description, image_url, ai_summary,
               created_at, updated_at
        FROM products
        WHERE id = ?
        "#,
    )
    .bind(product_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(product_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Replace a product's cached review summary
///
/// Last writer wins when two regenerations race; there is no versioning.
pub async fn update_ai_summary(
    pool: &SqlitePool,
    product_id: Uuid,
    summary_json: &str,
) -> Result<()> {
    sqlx::query("UPDATE products SET ai_summary = ?, updated_at = ? WHERE id = ?")
        .bind(summary_json)
        .bind(Utc::now().to_rfc3339())
        .bind(product_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert a product (used by tests and seed tooling)
pub async fn insert_product(pool: &SqlitePool, product: &Product) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO products (id, brand_id, name, sku, description, image_url,
                              ai_summary, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(product.id.to_string())
    .bind(product.brand_id.map(|id| id.to_string()))
    .bind(&product.name)
    .bind(&product.sku)
    .bind(&product.description)
    .bind(&product.image_url)
    .bind(&product.ai_summary)
    .bind(product.created_at.to_rfc3339())
    .bind(product.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

fn product_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
    let id: String = row.get("id");
    let brand_id: Option<String> = row.get("brand_id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Product {
        id: parse_uuid("products.id", &id)?,
        brand_id: brand_id
            .map(|v| parse_uuid("products.brand_id", &v))
            .transpose()?,
        name: row.get("name"),
        sku: row.get("sku"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        ai_summary: row.get("ai_summary"),
        created_at: parse_timestamp("products.created_at", &created_at)?,
        updated_at: parse_timestamp("products.updated_at", &updated_at)?,
    })
}
