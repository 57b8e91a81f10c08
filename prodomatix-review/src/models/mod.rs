//! Domain models for the review ingestion and syndication core

pub mod incentive;
pub mod product;
pub mod retailer;
pub mod review;

pub use incentive::Incentive;
pub use product::{Product, ProductSummary};
pub use retailer::Retailer;
pub use review::{
    MediaType, ModerationResult, Review, ReviewMedia, ReviewStatus, Sentiment,
};
