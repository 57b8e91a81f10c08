//! HTTP API handlers for prodomatix-review

pub mod health;
pub mod reviews;
pub mod syndication;

pub use health::health_routes;
pub use reviews::review_routes;
pub use syndication::syndication_routes;
