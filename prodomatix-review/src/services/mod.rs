//! Service layer for review processing and syndication

pub mod local_moderator;
pub mod moderation;
pub mod reasoning;
pub mod safety;
pub mod signer;
pub mod summary;
pub mod verification;
pub mod webhook;

pub use moderation::ModerationPipeline;
pub use signer::PayloadSigner;
pub use summary::SummaryRegenerator;
pub use webhook::WebhookDispatcher;
