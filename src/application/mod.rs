//! Application Layer
//!
//! The plugin model (modules, commands, config actions), the core services
//! that manage them, and the dispatch machinery that turns chat messages
//! into command runs.
//!
//! ## Structure
//!
//! - **plugin**: descriptors and validated plugin objects
//! - **services**: the service registry and the core services
//! - **parser**: prefix matching and argument/flag parsing
//! - **context** / **response**: what a command handler sees and answers with
//! - **builtin**: the modules every bot ships with

pub mod builtin;
pub mod context;
pub mod parser;
pub mod plugin;
pub mod response;
pub mod services;

pub use context::CommandContext;
pub use response::{ActionResult, Response, ResponseData, ResponseType};
