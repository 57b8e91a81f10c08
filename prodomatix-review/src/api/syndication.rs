//! Retailer-facing syndication read API
//!
//! Separate trust boundary over the same review rows: static API-key
//! auth, approved-only filtering, optional time lower-bound, hard cap.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{Review, ReviewMedia};
use crate::AppState;

/// Hard cap on results per call; no cursor pagination in this API
const MAX_RESULTS: i64 = 100;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
pub struct SyndicationQuery {
    pub since: Option<String>,
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
}

/// Product fields embedded in each syndicated review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyndicatedProduct {
    pub name: String,
    pub sku: String,
    pub image_url: Option<String>,
}

/// One review as exposed to a retail partner
#[derive(Debug, Serialize)]
pub struct SyndicatedReview {
    #[serde(flatten)]
    pub review: Review,
    pub product: Option<SyndicatedProduct>,
    pub media: Vec<ReviewMedia>,
}

/// Syndication response body
#[derive(Debug, Serialize)]
pub struct SyndicationResponse {
    pub retailer: String,
    pub count: usize,
    pub reviews: Vec<SyndicatedReview>,
}

/// GET /api/syndication
///
/// Header `x-api-key` authenticates the retailer: absent key is a 401,
/// unknown key a 403 (callers branch on the distinction).
pub async fn list_syndicated_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SyndicationQuery>,
) -> ApiResult<Json<SyndicationResponse>> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingApiKey)?;

    let retailer = db::retailers::find_by_api_key(&state.db, api_key)
        .await?
        .ok_or(ApiError::InvalidApiKey)?;

    // Unparsable filter values fall back to unfiltered, not to an error
    let since = query.since.as_deref().and_then(parse_since);
    let product_id = query.product_id.as_deref().and_then(|value| {
        let parsed = Uuid::parse_str(value).ok();
        if parsed.is_none() {
            debug!("Ignoring unparsable productId filter: {}", value);
        }
        parsed
    });

    let reviews = db::reviews::list_approved(&state.db, since, product_id, MAX_RESULTS).await?;

    // Product rows repeat across reviews; resolve each product once
    let mut products: HashMap<Uuid, Option<SyndicatedProduct>> = HashMap::new();
    let mut syndicated = Vec::with_capacity(reviews.len());

    for review in reviews {
        let product = match products.get(&review.product_id) {
            Some(cached) => cached.clone(),
            None => {
                let loaded = db::products::get_product(&state.db, review.product_id)
                    .await?
                    .map(|p| SyndicatedProduct {
                        name: p.name,
                        sku: p.sku,
                        image_url: p.image_url,
                    });
                products.insert(review.product_id, loaded.clone());
                loaded
            }
        };

        let media = db::reviews::media_for_review(&state.db, review.id).await?;

        syndicated.push(SyndicatedReview {
            review,
            product,
            media,
        });
    }

    Ok(Json(SyndicationResponse {
        retailer: retailer.name,
        count: syndicated.len(),
        reviews: syndicated,
    }))
}

/// Parse the `since` filter: RFC 3339 first, then a bare date
///
/// Invalid values yield None (silently ignored per the API contract).
fn parse_since(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    debug!("Ignoring unparsable since filter: {}", value);
    None
}

/// Build syndication routes
pub fn syndication_routes() -> Router<AppState> {
    Router::new().route("/api/syndication", get(list_syndicated_reviews))
}
