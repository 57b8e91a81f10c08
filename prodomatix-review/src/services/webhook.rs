//! Webhook fan-out to subscribed retailers
//!
//! Best-effort, at-most-once push delivery of review.created events.
//! Deliveries run concurrently, one task per retailer; a failing retailer
//! is logged and never delays or cancels the others. No retry queue and
//! no persistence of undelivered events.

use serde_json::json;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::db;
use crate::models::{Product, Review};
use crate::services::signer::PayloadSigner;

pub const SIGNATURE_HEADER: &str = "X-Prodomatix-Signature";
pub const EVENT_HEADER: &str = "X-Prodomatix-Event";
pub const REVIEW_CREATED_EVENT: &str = "review.created";

/// Per-retailer delivery timeout so one slow subscriber cannot pin
/// dispatcher capacity
const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Fans review events out to every push-subscribed retailer
pub struct WebhookDispatcher {
    http_client: reqwest::Client,
    signer: PayloadSigner,
}

impl WebhookDispatcher {
    pub fn new(signer: PayloadSigner) -> prodomatix_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                prodomatix_common::Error::Internal(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            signer,
        })
    }

    /// Deliver a review.created event to every subscribed retailer
    ///
    /// Fire-and-forget from the caller's perspective; nothing here
    /// propagates back to the submission path.
    pub async fn dispatch(&self, pool: &SqlitePool, review: &Review, product: &Product) {
        let subscribers = match db::retailers::webhook_subscribers(pool).await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                error!("Webhook dispatch aborted: failed to load subscribers: {}", e);
                return;
            }
        };

        if subscribers.is_empty() {
            return;
        }

        let data = json!({
            "reviewId": review.id,
            "productId": product.id,
            "productSku": product.sku,
            "rating": review.rating,
            "content": review.content,
            "sentiment": review.sentiment,
            "isVerified": review.is_verified,
            "createdAt": review.created_at,
        });
        let payload = json!({
            "event": REVIEW_CREATED_EVENT,
            "data": data,
        });

        let mut deliveries = JoinSet::new();

        for retailer in subscribers {
            let Some(webhook_url) = retailer.webhook_url.clone() else {
                continue;
            };

            // Signed with the system secret (per-retailer secrets reserved)
            let signature = match self.signer.sign(&data) {
                Ok(signature) => signature,
                Err(e) => {
                    error!(
                        retailer_id = %retailer.id,
                        retailer = %retailer.name,
                        "Failed to sign webhook payload: {}", e
                    );
                    continue;
                }
            };

            let http_client = self.http_client.clone();
            let payload = payload.clone();
            let retailer_id = retailer.id;
            let retailer_name = retailer.name.clone();

            deliveries.spawn(async move {
                let result = http_client
                    .post(&webhook_url)
                    .header(SIGNATURE_HEADER, signature)
                    .header(EVENT_HEADER, REVIEW_CREATED_EVENT)
                    .json(&payload)
                    .send()
                    .await;

                match result {
                    Ok(response) if response.status().is_success() => {
                        info!(retailer_id = %retailer_id, retailer = %retailer_name, "Webhook delivered");
                    }
                    Ok(response) => {
                        warn!(
                            retailer_id = %retailer_id,
                            retailer = %retailer_name,
                            status = %response.status(),
                            "Webhook delivery rejected by retailer"
                        );
                    }
                    Err(e) => {
                        warn!(
                            retailer_id = %retailer_id,
                            retailer = %retailer_name,
                            "Webhook delivery failed: {}", e
                        );
                    }
                }
            });
        }

        // Drain every attempt; individual outcomes were already logged
        while deliveries.join_next().await.is_some() {}
    }
}
