//! Review and review media database operations

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use prodomatix_common::{Error, Result};

use crate::db::{parse_timestamp, parse_uuid};
use crate::models::{MediaType, Review, ReviewMedia, ReviewStatus, Sentiment};

/// Persist a new review
///
/// The caller builds the full row (including the moderation outcome and
/// verification flag) so status and sentiment land atomically in one write.
pub async fn insert_review(pool: &SqlitePool, review: &Review) -> Result<()> {
    let tags = serde_json::to_string(&review.tags)
        .map_err(|e| Error::Internal(format!("Failed to serialize tags: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO reviews (
            id, product_id, retailer_id, rating, title, content,
            reviewer_name, reviewer_email, is_verified, status, sentiment,
            tags, manufacturer_response, manufacturer_response_date, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.id.to_string())
    .bind(review.product_id.to_string())
    .bind(review.retailer_id.map(|id| id.to_string()))
    .bind(review.rating)
    .bind(&review.title)
    .bind(&review.content)
    .bind(&review.reviewer_name)
    .bind(&review.reviewer_email)
    .bind(review.is_verified)
    .bind(review.status.as_str())
    .bind(review.sentiment.map(|s| s.as_str()))
    .bind(&tags)
    .bind(&review.manufacturer_response)
    .bind(review.manufacturer_response_date.map(|dt| dt.to_rfc3339()))
    .bind(review.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist media attachments for a review
pub async fn insert_media(pool: &SqlitePool, media: &[ReviewMedia]) -> Result<()> {
    for item in media {
        sqlx::query(
            r#"
            INSERT INTO review_media (id, review_id, url, type, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.review_id.to_string())
        .bind(&item.url)
        .bind(item.media_type.as_str())
        .bind(item.created_at.to_rfc3339())
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Load the media attached to a review
pub async fn media_for_review(pool: &SqlitePool, review_id: Uuid) -> Result<Vec<ReviewMedia>> {
    let rows = sqlx::query(
        r#"
        SELECT id, review_id, url, type, created_at
        FROM review_media
        WHERE review_id = ?
        ORDER BY created_at
        "#,
    )
    .bind(review_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(media_from_row).collect()
}

/// List approved reviews, newest first, bounded by `limit`
///
/// Timestamps are stored as RFC 3339 UTC text, so the lower-bound filter
/// compares lexicographically.
pub async fn list_approved(
    pool: &SqlitePool,
    since: Option<DateTime<Utc>>,
    product_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<Review>> {
    let mut sql = String::from(
        "SELECT id, product_id, retailer_id, rating, title, content, \
         reviewer_name, reviewer_email, is_verified, status, sentiment, tags, \
         manufacturer_response, manufacturer_response_date, created_at \
         FROM reviews WHERE status = 'approved'",
    );
    if since.is_some() {
        sql.push_str(" AND created_at >= ?");
    }
    if product_id.is_some() {
        sql.push_str(" AND product_id = ?");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ?");

    let mut query = sqlx::query(&sql);
    if let Some(since) = since {
        query = query.bind(since.to_rfc3339());
    }
    if let Some(product_id) = product_id {
        query = query.bind(product_id.to_string());
    }
    query = query.bind(limit);

    let rows = query.fetch_all(pool).await?;

    rows.iter().map(review_from_row).collect()
}

/// Most recent approved reviews for one product (summary input)
pub async fn recent_approved_for_product(
    pool: &SqlitePool,
    product_id: Uuid,
    limit: i64,
) -> Result<Vec<Review>> {
    list_approved(pool, None, Some(product_id), limit).await
}

/// Count and average rating over a product's approved reviews
pub async fn approved_stats(pool: &SqlitePool, product_id: Uuid) -> Result<(i64, f64)> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS review_count, COALESCE(AVG(rating), 0.0) AS avg_rating
        FROM reviews
        WHERE product_id = ? AND status = 'approved'
        "#,
    )
    .bind(product_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok((row.get("review_count"), row.get("avg_rating")))
}

fn review_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Review> {
    let id: String = row.get("id");
    let product_id: String = row.get("product_id");
    let retailer_id: Option<String> = row.get("retailer_id");
    let status: String = row.get("status");
    let sentiment: Option<String> = row.get("sentiment");
    let tags: String = row.get("tags");
    let response_date: Option<String> = row.get("manufacturer_response_date");
    let created_at: String = row.get("created_at");

    let status = ReviewStatus::parse(&status)
        .ok_or_else(|| Error::Internal(format!("Unknown review status: {}", status)))?;
    let sentiment = sentiment
        .map(|s| {
            Sentiment::parse(&s)
                .ok_or_else(|| Error::Internal(format!("Unknown sentiment: {}", s)))
        })
        .transpose()?;
    let tags: Vec<String> = serde_json::from_str(&tags)
        .map_err(|e| Error::Internal(format!("Failed to parse tags: {}", e)))?;

    Ok(Review {
        id: parse_uuid("reviews.id", &id)?,
        product_id: parse_uuid("reviews.product_id", &product_id)?,
        retailer_id: retailer_id
            .map(|v| parse_uuid("reviews.retailer_id", &v))
            .transpose()?,
        rating: row.get("rating"),
        title: row.get("title"),
        content: row.get("content"),
        reviewer_name: row.get("reviewer_name"),
        reviewer_email: row.get("reviewer_email"),
        is_verified: row.get("is_verified"),
        status,
        sentiment,
        tags,
        manufacturer_response: row.get("manufacturer_response"),
        manufacturer_response_date: response_date
            .map(|v| parse_timestamp("reviews.manufacturer_response_date", &v))
            .transpose()?,
        created_at: parse_timestamp("reviews.created_at", &created_at)?,
    })
}

fn media_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ReviewMedia> {
    let id: String = row.get("id");
    let review_id: String = row.get("review_id");
    let media_type: String = row.get("type");
    let created_at: String = row.get("created_at");

    Ok(ReviewMedia {
        id: parse_uuid("review_media.id", &id)?,
        review_id: parse_uuid("review_media.review_id", &review_id)?,
        url: row.get("url"),
        media_type: MediaType::parse(&media_type)
            .ok_or_else(|| Error::Internal(format!("Unknown media type: {}", media_type)))?,
        created_at: parse_timestamp("review_media.created_at", &created_at)?,
    })
}
