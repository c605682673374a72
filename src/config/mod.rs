//! # Configuration Module
//!
//! This module handles bot configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use botframe::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Default prefix is {}", settings.default_prefix);
//! ```

mod response_strings;
mod settings;

pub use response_strings::*;
pub use settings::*;
