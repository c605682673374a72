//! Shared Utilities
//!
//! Common utilities used across all layers.

pub mod error;
pub mod mention;

pub use error::BotError;
