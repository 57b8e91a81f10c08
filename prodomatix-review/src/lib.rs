//! prodomatix-review library interface
//!
//! Review ingestion, moderation, and syndication core. Exposed as a
//! library so integration tests can drive the router directly.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use prodomatix_common::config::ServiceConfig;
use prodomatix_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::services::reasoning::ChatClient;
use crate::services::safety::SafetyClient;
use crate::services::{ModerationPipeline, PayloadSigner, SummaryRegenerator, WebhookDispatcher};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Moderation pipeline (safety + reasoning + local fallback)
    pub moderation: Arc<ModerationPipeline>,
    /// Webhook fan-out for approved reviews
    pub webhooks: Arc<WebhookDispatcher>,
    /// Product summary regeneration
    pub summaries: Arc<SummaryRegenerator>,
    /// Detached background work; drained on shutdown so webhook and
    /// summary tasks are not orphaned by process exit
    pub background_tasks: TaskTracker,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &ServiceConfig) -> Result<Self> {
        let safety = config
            .safety_api_key
            .clone()
            .map(SafetyClient::new)
            .transpose()
            .map_err(|e| Error::Config(format!("Safety client init failed: {}", e)))?;

        let reasoning = config
            .reasoning_api_key
            .clone()
            .map(ChatClient::new)
            .transpose()
            .map_err(|e| Error::Config(format!("Reasoning client init failed: {}", e)))?;

        // The summary regenerator shares the reasoning credentials
        let summary_chat = config
            .reasoning_api_key
            .clone()
            .map(ChatClient::new)
            .transpose()
            .map_err(|e| Error::Config(format!("Summary client init failed: {}", e)))?;

        let signer = PayloadSigner::new(&config.syndication_secret);

        Ok(Self {
            db,
            moderation: Arc::new(ModerationPipeline::new(safety, reasoning)),
            webhooks: Arc::new(WebhookDispatcher::new(signer)?),
            summaries: Arc::new(SummaryRegenerator::new(summary_chat)),
            background_tasks: TaskTracker::new(),
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::review_routes())
        .merge(api::syndication_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
