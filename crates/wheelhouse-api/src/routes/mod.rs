//! # API Route Modules
//!
//! - `simple`: Simple Repository API: project index, per-project file
//!   index, and wheel download.
//!
//! Health checks and the metrics scrape endpoint live in the crate root.

pub mod simple;
