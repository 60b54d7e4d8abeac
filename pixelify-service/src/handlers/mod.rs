//! HTTP handlers for the pixelify service.

pub mod conversions;
pub mod health;

pub use conversions::{history, pixelify, root};
pub use health::{health_check, not_found, readiness_check};
