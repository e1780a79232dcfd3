//! # HTTP Middleware
//!
//! - `metrics`: per-request counters keyed by matched route.

pub mod metrics;
