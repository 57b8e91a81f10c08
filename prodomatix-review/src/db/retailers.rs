//! Retailer database operations

use sqlx::{Row, SqlitePool};

use prodomatix_common::Result;

use crate::db::{parse_timestamp, parse_uuid};
use crate::models::Retailer;

/// Find the retailer owning the given syndication API key
pub async fn find_by_api_key(pool: &SqlitePool, api_key: &str) -> Result<Option<Retailer>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, website, api_key, webhook_url, webhook_secret,
               created_at, updated_at
        FROM retailers
        WHERE api_key = ?
        "#,
    )
    .bind(api_key)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(retailer_from_row(&row)?)),
        None => Ok(None),
    }
}

/// List every retailer subscribed to push delivery (non-null webhook URL)
pub async fn webhook_subscribers(pool: &SqlitePool) -> Result<Vec<Retailer>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, website, api_key, webhook_url, webhook_secret,
               created_at, updated_at
        FROM retailers
        WHERE webhook_url IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(retailer_from_row).collect()
}

/// Insert a retailer (used by tests and seed tooling)
pub async fn insert_retailer(pool: &SqlitePool, retailer: &Retailer) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO retailers (id, name, website, api_key, webhook_url,
                               webhook_secret, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(retailer.id.to_string())
    .bind(&retailer.name)
    .bind(&retailer.website)
    .bind(&retailer.api_key)
    .bind(&retailer.webhook_url)
    .bind(&retailer.webhook_secret)
    .bind(retailer.created_at.to_rfc3339())
    .bind(retailer.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

fn retailer_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Retailer> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Retailer {
        id: parse_uuid("retailers.id", &id)?,
        name: row.get("name"),
        website: row.get("website"),
        api_key: row.get("api_key"),
        webhook_url: row.get("webhook_url"),
        webhook_secret: row.get("webhook_secret"),
        created_at: parse_timestamp("retailers.created_at", &created_at)?,
        updated_at: parse_timestamp("retailers.updated_at", &updated_at)?,
    })
}
