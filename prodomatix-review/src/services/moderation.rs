//! Two-pass moderation pipeline with deterministic fallback
//!
//! Stage 1: binary safety check (skipped fail-open when unconfigured).
//! Stage 2: reasoning classifier, used verbatim on success.
//! Stage 3: local rules, absorbing every stage-2 failure.
//!
//! The pipeline never returns an error; a moderation decision always
//! comes out the other side.

use tracing::{debug, warn};

use crate::models::{ModerationResult, ReviewStatus, Sentiment};
use crate::services::local_moderator::moderate_locally;
use crate::services::reasoning::{ChatClient, ChatError};
use crate::services::safety::SafetyClient;

/// Orchestrates safety check, reasoning classification, and local fallback
pub struct ModerationPipeline {
    safety: Option<SafetyClient>,
    reasoning: Option<ChatClient>,
}

impl ModerationPipeline {
    pub fn new(safety: Option<SafetyClient>, reasoning: Option<ChatClient>) -> Self {
        if safety.is_none() {
            warn!("Safety classifier not configured; safety stage will be skipped (fail-open)");
        }
        if reasoning.is_none() {
            warn!("Reasoning classifier not configured; moderation will use local rules only");
        }
        Self { safety, reasoning }
    }

    /// Moderate one review submission
    pub async fn moderate(&self, title: &str, content: &str, rating: i64) -> ModerationResult {
        // Stage 1: safety check. Flagged content never reaches stage 2.
        if let Some(safety) = &self.safety {
            match safety.check(content).await {
                Ok(verdict) if verdict.flagged => {
                    return ModerationResult {
                        status: ReviewStatus::Rejected,
                        sentiment: Sentiment::Negative,
                        reason: Some(format!(
                            "Flagged by safety classifier: {}",
                            verdict.categories.join(", ")
                        )),
                        tags: vec!["policy_violation".to_string()],
                    };
                }
                Ok(_) => {}
                Err(e) => {
                    // Advisory stage: treat a failed check as not flagged
                    warn!("Safety check failed (continuing unflagged): {}", e);
                }
            }
        } else {
            debug!("Safety stage skipped: no classifier configured");
        }

        // Stage 2: reasoning classifier
        match &self.reasoning {
            Some(reasoning) => match reasoning.classify_review(title, content, rating).await {
                Ok(result) => result,
                Err(ChatError::RateLimited) => {
                    warn!("Reasoning classifier rate limited; using local fallback");
                    moderate_locally(title, content, rating)
                }
                Err(e) => {
                    warn!("Reasoning classifier error ({}); using local fallback", e);
                    moderate_locally(title, content, rating)
                }
            },
            // Stage 3 directly when no classifier is configured
            None => moderate_locally(title, content, rating),
        }
    }
}
