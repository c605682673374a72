//! Infrastructure Layer
//!
//! Implementations of the domain ports and process-wide plumbing:
//! - Guild data stores (in-memory, JSON file)
//! - An in-process chat platform for tests and the console runner
//! - Prometheus metrics

pub mod data;
pub mod metrics;
pub mod platform;
