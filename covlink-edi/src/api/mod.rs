//! HTTP API for covlink-edi

pub mod covers;
pub mod health;

pub use covers::cover_routes;
pub use health::health_routes;
