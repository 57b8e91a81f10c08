//! Product summary regeneration
//!
//! Recomputes the cached pros/cons/verdict blob for a product from its
//! recent approved reviews. Runs detached from the submission path;
//! failures are logged and the stale summary stays in place. Concurrent
//! runs for the same product are accepted, last writer wins.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use prodomatix_common::{Error, Result};

use crate::db;
use crate::models::ProductSummary;
use crate::services::reasoning::{parse_json_response, ChatClient};

/// Reviews fed into one summary generation
const SUMMARY_WINDOW: i64 = 20;
/// Below this many approved reviews, no summary is produced
const MIN_REVIEWS_FOR_SUMMARY: usize = 3;

const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Regenerates a product's aggregate review summary
pub struct SummaryRegenerator {
    chat: Option<ChatClient>,
}

impl SummaryRegenerator {
    pub fn new(chat: Option<ChatClient>) -> Self {
        Self { chat }
    }

    /// Recompute and persist the summary for one product
    ///
    /// Returns Ok(None) when there is not enough data or no generative
    /// capability is configured.
    pub async fn regenerate(
        &self,
        pool: &SqlitePool,
        product_id: Uuid,
    ) -> Result<Option<ProductSummary>> {
        let Some(chat) = &self.chat else {
            debug!("Summary regeneration skipped: no generative client configured");
            return Ok(None);
        };

        let recent =
            db::reviews::recent_approved_for_product(pool, product_id, SUMMARY_WINDOW).await?;

        if recent.len() < MIN_REVIEWS_FOR_SUMMARY {
            debug!(
                product_id = %product_id,
                count = recent.len(),
                "Summary regeneration skipped: not enough approved reviews"
            );
            return Ok(None);
        }

        let review_text: Vec<String> = recent
            .iter()
            .map(|r| format!("- Rating: {}/5. \"{}\"", r.rating, r.content))
            .collect();
        let prompt = summary_prompt(&review_text.join("\n"));

        let output = chat
            .complete(&prompt, SUMMARY_TEMPERATURE)
            .await
            .map_err(|e| Error::Internal(format!("Summary generation failed: {}", e)))?;

        let summary: ProductSummary = parse_json_response(&output)
            .map_err(|e| Error::Internal(format!("Summary output unparsable: {}", e)))?;

        let summary_json = serde_json::to_string(&summary)
            .map_err(|e| Error::Internal(format!("Failed to serialize summary: {}", e)))?;
        db::products::update_ai_summary(pool, product_id, &summary_json).await?;

        Ok(Some(summary))
    }
}

fn summary_prompt(reviews: &str) -> String {
    format!(
        r#"You are an expert product analyst. Review the following customer feedback for a product and synthesize a concise summary.

REVIEWS:
{reviews}

TASKS:
1. Identify the top 3 Pros (recurring positive themes).
2. Identify the top 3 Cons (recurring negative themes).
3. Write a 1-sentence Verdict summarizing the general consensus.

Return the result as a raw JSON object with the following keys:
"pros" (array of strings), "cons" (array of strings), "verdict" (string).
Do not include any other text in your response."#
    )
}
