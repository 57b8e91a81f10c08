//! Deterministic rule-based moderation
//!
//! Used when the reasoning classifier is unavailable or errors. Keyword
//! scoring is intentionally crude; anything it cannot reject outright is
//! left pending for human review rather than auto-approved.

use crate::models::{ModerationResult, ReviewStatus, Sentiment};

/// Minimal profanity list; substring match over lowercased text
const PROFANITY: &[&str] = &["fuck", "shit", "ass", "bitch", "damn"];

const POSITIVE_WORDS: &[&str] = &[
    "love", "great", "excellent", "good", "amazing", "best", "perfect",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "worst", "awful", "horrible", "broken", "failed",
];

/// Classify a review with local rules only
pub fn moderate_locally(title: &str, content: &str, rating: i64) -> ModerationResult {
    let combined = format!("{} {}", title, content).to_lowercase();

    if PROFANITY.iter().any(|word| combined.contains(word)) {
        return ModerationResult {
            status: ReviewStatus::Rejected,
            sentiment: Sentiment::Negative,
            reason: Some("Local rule: profanity detected".to_string()),
            tags: vec!["policy_violation".to_string()],
        };
    }

    let mut score: i32 = 0;
    for word in POSITIVE_WORDS {
        if combined.contains(word) {
            score += 1;
        }
    }
    for word in NEGATIVE_WORDS {
        if combined.contains(word) {
            score -= 1;
        }
    }

    let sentiment = if score > 0 || rating >= 4 {
        Sentiment::Positive
    } else if score < 0 || rating <= 2 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };

    // Never auto-approve while the primary classifier is down
    ModerationResult {
        status: ReviewStatus::Pending,
        sentiment,
        reason: Some(
            "Processed via local fallback (primary classifier unavailable)".to_string(),
        ),
        tags: vec!["local_scan".to_string()],
    }
}
