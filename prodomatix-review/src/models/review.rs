//! Review, media, and moderation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publishability of a review
///
/// Set exactly once by the moderation pipeline at creation time; later
/// changes come only from the manual moderator workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

/// Sentiment extracted from the review text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

/// Output of one moderation pipeline invocation
///
/// Ephemeral value object; its fields are folded into the Review row at
/// creation and never persisted independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    pub status: ReviewStatus,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub reason: Option<String>,
    /// Classifiers may omit tags or emit an explicit null; both mean none
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tags = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(tags.unwrap_or_default())
}

/// A single consumer review submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    /// None means the review came in through the brand's own site
    pub retailer_id: Option<Uuid>,
    pub rating: i64,
    pub title: Option<String>,
    pub content: String,
    pub reviewer_name: Option<String>,
    pub reviewer_email: Option<String>,
    /// Set once at creation from the purchase verifier, never revised
    pub is_verified: bool,
    pub status: ReviewStatus,
    pub sentiment: Option<Sentiment>,
    pub tags: Vec<String>,
    pub manufacturer_response: Option<String>,
    pub manufacturer_response_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Media kind attached to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }

    /// Classify a media URL by its file extension; anything that is not
    /// a known video extension is treated as an image.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        if path.ends_with(".mp4") || path.ends_with(".webm") || path.ends_with(".ogg") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

/// One media attachment on a review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMedia {
    pub id: Uuid,
    pub review_id: Uuid,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
}
