//! Reasoning classifier client
//!
//! Deep review classification through a Groq-style chat-completions API.
//! The same client also serves the summary regenerator, which only needs
//! raw completions at a different temperature.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::ModerationResult;

const CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const MODEL: &str = "llama-3.3-70b-versatile";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Reasoning classifier errors; every variant routes the pipeline into
/// the local fallback stage.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat-completions client
pub struct ChatClient {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ChatClient {
    pub fn new(api_key: String) -> Result<Self, ChatError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            endpoint: CHAT_COMPLETIONS_URL.to_string(),
        })
    }

    /// Point the client at a different chat-completions endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Issue a single-turn completion and return the raw model output
    pub async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ChatError> {
        let request = ChatRequest {
            model: MODEL,
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ChatError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatError::Api(status.as_u16(), error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ChatError::Parse("Empty completion choices".to_string()))
    }

    /// Classify a review submission
    ///
    /// The model is instructed to answer with a bare JSON object; fenced
    /// output is tolerated and stripped before parsing.
    pub async fn classify_review(
        &self,
        title: &str,
        content: &str,
        rating: i64,
    ) -> Result<ModerationResult, ChatError> {
        let prompt = moderation_prompt(title, content, rating);
        let output = self.complete(&prompt, 0.0).await?;
        parse_json_response(&output)
    }
}

/// Strip markdown code fences and parse the remainder as JSON
pub fn parse_json_response<T: serde::de::DeserializeOwned>(output: &str) -> Result<T, ChatError> {
    let cleaned = output.replace("```json", "").replace("```", "");
    serde_json::from_str(cleaned.trim()).map_err(|e| ChatError::Parse(e.to_string()))
}

fn moderation_prompt(title: &str, content: &str, rating: i64) -> String {
    format!(
        r#"You are an expert content moderator for an e-commerce platform.
Analyze the following product review and determine if it should be approved, rejected, or needs manual review (pending).

Input:
Rating: {rating} / 5
Title: {title}
Content: {content}

REJECTION CRITERIA:
- Profanity or offensive language.
- Obvious spam or promotional content for other products.
- Gibberish or irrelevant content.
- Hate speech or harassment.

PENDING CRITERIA:
- Highly suspicious content that might be fake but isn't obvious spam.
- Content that mentions competitors in a way that needs human verification.
- RATING MISMATCH: The sentiment of the text strongly contradicts the numeric rating (e.g., 5 stars but "Terrible product", or 1 star but "I love it").

TASKS:
1. Assign a status: "approved", "rejected", or "pending".
2. Extract the sentiment: "positive", "neutral", or "negative".
3. Provide a brief reason if rejected or pending (specifically mention "Rating Mismatch" if applicable).
4. Extract key tags (e.g., "Quality", "Price", "Shipping").

Return the result as a raw JSON object with the following keys:
"status", "sentiment", "reason", "tags" (array of strings).
Do not include any other text in your response."#
    )
}
