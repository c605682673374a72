//! # Botframe
//!
//! An extensible command-bot framework for guild-based chat platforms:
//! - Plugin modules bundling commands, services and config actions
//! - Per-guild prefixes, module and command enablement
//! - Permission levels granted to roles and users
//! - A filtered dispatch pipeline with contained failures
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: platform entities, value objects and the ports
//!   (`ChatPlatform`, `GuildDataRepository`)
//! - **Application Layer**: plugin model, core services, parser, dispatch
//! - **Infrastructure Layer**: data stores, the local platform, metrics
//!
//! ## Module Structure
//!
//! ```text
//! botframe/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, ports
//! +-- application/    Plugins, services, parser, built-in modules
//! +-- infrastructure/ Data stores, local platform, metrics
//! +-- shared/         Errors and mention parsing
//! +-- startup.rs      Bot assembly and lifecycle
//! ```

// Configuration module
pub mod config;

// Domain layer - Entities and ports
pub mod domain;

// Application layer - Plugins and core services
pub mod application;

// Infrastructure layer - Port implementations
pub mod infrastructure;

// Shared utilities
pub mod shared;

// Bot assembly and lifecycle
pub mod startup;

// Telemetry and observability
pub mod telemetry;

pub use shared::error::BotError;
pub use startup::{Bot, BotBuilder, BotHandle};
