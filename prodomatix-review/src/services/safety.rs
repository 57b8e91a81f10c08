//! Content-safety classifier client
//!
//! Fast binary check against an OpenAI-compatible moderations endpoint.
//! The pipeline treats this stage as advisory: an unconfigured or failing
//! client means "not flagged".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

const MODERATIONS_URL: &str = "https://api.openai.com/v1/moderations";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Safety classifier errors
#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Outcome of the safety check
#[derive(Debug, Clone)]
pub struct SafetyVerdict {
    pub flagged: bool,
    /// Names of the categories that triggered, sorted for stable output
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationEntry>,
}

#[derive(Debug, Deserialize)]
struct ModerationEntry {
    flagged: bool,
    categories: BTreeMap<String, bool>,
}

/// Moderations API client
pub struct SafetyClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl SafetyClient {
    pub fn new(api_key: String) -> Result<Self, SafetyError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SafetyError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// Run the safety check over the review content
    pub async fn check(&self, content: &str) -> Result<SafetyVerdict, SafetyError> {
        let response = self
            .http_client
            .post(MODERATIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&ModerationRequest { input: content })
            .send()
            .await
            .map_err(|e| SafetyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SafetyError::Api(status.as_u16(), error_text));
        }

        let body: ModerationResponse = response
            .json()
            .await
            .map_err(|e| SafetyError::Parse(e.to_string()))?;

        let entry = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| SafetyError::Parse("Empty moderation results".to_string()))?;

        let categories = entry
            .categories
            .into_iter()
            .filter(|(_, triggered)| *triggered)
            .map(|(name, _)| name)
            .collect();

        Ok(SafetyVerdict {
            flagged: entry.flagged,
            categories,
        })
    }
}
