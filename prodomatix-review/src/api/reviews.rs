//! Review submission and product aggregate endpoints
//!
//! POST /api/reviews is the single write entry point: validate, verify
//! the purchase, moderate, persist, then detach the summary and webhook
//! work. The caller's response waits only on the persisted row and the
//! final moderation decision.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{MediaType, Review, ReviewMedia, ReviewStatus};
use crate::services::verification::verify_purchase;
use crate::AppState;

/// Minimum accepted review content length
const MIN_CONTENT_LENGTH: usize = 5;

/// Review submission request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub product_id: Uuid,
    /// Accepted as any JSON number so that fractional ratings fail
    /// validation instead of body deserialization
    pub rating: serde_json::Number,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    #[serde(default)]
    pub reviewer_email: Option<String>,
    #[serde(default)]
    pub media_urls: Option<Vec<String>>,
}

/// Review submission response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewResponse {
    pub message: String,
    pub review_id: Uuid,
    pub moderation_status: ReviewStatus,
    pub is_verified: bool,
    pub incentive_code: Option<String>,
}

/// POST /api/reviews
///
/// Rejection by moderation is a successful outcome: the review is stored
/// with its decision and reported back as created.
pub async fn submit_review(
    State(state): State<AppState>,
    Json(request): Json<SubmitReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let rating = validate_submission(&request)?;

    let product = db::products::get_product(&state.db, request.product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    // Verified-buyer check is advisory and only runs when an email was given
    let is_verified = match request.reviewer_email.as_deref() {
        Some(email) => verify_purchase(&state.db, email, product.id).await,
        None => false,
    };

    let moderation = state
        .moderation
        .moderate(request.title.as_deref().unwrap_or(""), &request.content, rating)
        .await;

    // Status and sentiment land in one write, from exactly one pipeline run
    let review = Review {
        id: Uuid::new_v4(),
        product_id: product.id,
        retailer_id: None,
        rating,
        title: request.title.clone(),
        content: request.content.clone(),
        reviewer_name: request.reviewer_name.clone(),
        reviewer_email: request.reviewer_email.clone(),
        is_verified,
        status: moderation.status,
        sentiment: Some(moderation.sentiment),
        tags: moderation.tags.clone(),
        manufacturer_response: None,
        manufacturer_response_date: None,
        created_at: Utc::now(),
    };
    db::reviews::insert_review(&state.db, &review).await?;

    if let Some(urls) = &request.media_urls {
        let media: Vec<ReviewMedia> = urls
            .iter()
            .map(|url| ReviewMedia {
                id: Uuid::new_v4(),
                review_id: review.id,
                url: url.clone(),
                media_type: MediaType::from_url(url),
                created_at: Utc::now(),
            })
            .collect();
        db::reviews::insert_media(&state.db, &media).await?;
    }

    let incentive_code = db::incentives::find_active_for_product(&state.db, product.id)
        .await?
        .map(|incentive| incentive.code);

    info!(
        review_id = %review.id,
        product_id = %product.id,
        status = moderation.status.as_str(),
        verified = is_verified,
        "Review ingested"
    );

    // Detached background work; failures are logged, never surfaced, and
    // never roll back the persisted review.
    {
        let pool = state.db.clone();
        let summaries = state.summaries.clone();
        let product_id = product.id;
        state.background_tasks.spawn(async move {
            if let Err(e) = summaries.regenerate(&pool, product_id).await {
                error!(product_id = %product_id, "Background summary regeneration failed: {}", e);
            }
        });
    }

    if review.status == ReviewStatus::Approved {
        let pool = state.db.clone();
        let webhooks = state.webhooks.clone();
        let review = review.clone();
        let product = product.clone();
        state.background_tasks.spawn(async move {
            webhooks.dispatch(&pool, &review, &product).await;
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(SubmitReviewResponse {
            message: "Review submitted successfully".to_string(),
            review_id: review.id,
            moderation_status: review.status,
            is_verified,
            incentive_code,
        }),
    ))
}

/// Validate a submission before any side effect
///
/// Returns the rating as an integer; fractional numbers (4.5) fail here
/// with the same error shape as out-of-range ones.
fn validate_submission(request: &SubmitReviewRequest) -> Result<i64, ApiError> {
    let mut errors = Vec::new();

    let rating = request.rating.as_i64().filter(|r| (1..=5).contains(r));
    if rating.is_none() {
        errors.push("rating must be an integer between 1 and 5".to_string());
    }

    if request.content.len() < MIN_CONTENT_LENGTH {
        errors.push(format!(
            "content must be at least {} characters",
            MIN_CONTENT_LENGTH
        ));
    }

    if let Some(email) = &request.reviewer_email {
        if !is_valid_email(email) {
            errors.push("reviewerEmail must be a valid email address".to_string());
        }
    }

    if let Some(urls) = &request.media_urls {
        for url in urls {
            if reqwest::Url::parse(url).is_err() {
                errors.push(format!("mediaUrls entry is not a valid URL: {}", url));
            }
        }
    }

    match rating {
        Some(rating) if errors.is_empty() => Ok(rating),
        _ => Err(ApiError::Validation(errors)),
    }
}

/// Syntactic email check: one @, non-empty local part, dotted domain
fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductStatsQuery {
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
}

/// GET /api/reviews?productId=<id>
///
/// Public aggregate over a product's approved reviews.
pub async fn product_stats(
    State(state): State<AppState>,
    Query(query): Query<ProductStatsQuery>,
) -> ApiResult<impl IntoResponse> {
    let product_id = query
        .product_id
        .ok_or_else(|| ApiError::BadRequest("Product ID is required".to_string()))?;
    let product_id = Uuid::parse_str(&product_id)
        .map_err(|_| ApiError::BadRequest("Invalid product ID".to_string()))?;

    let product = db::products::get_product(&state.db, product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let (review_count, avg_rating) = db::reviews::approved_stats(&state.db, product_id).await?;

    Ok(Json(json!({
        "product": {
            "name": product.name,
            "sku": product.sku,
            "imageUrl": product.image_url,
        },
        "aggregates": {
            "ratingValue": format!("{:.1}", avg_rating),
            "reviewCount": review_count,
        },
    })))
}

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/api/reviews", post(submit_review).get(product_stats))
}
