//! Built-in modules, loaded before any external module:
//!
//! - **core**: `config` and `help` commands, the `setPrefix` action
//! - **module**: enable, disable and inspect modules per guild
//! - **command**: enable, disable and inspect commands per guild
//! - **permissions**: the `admin` and `mod` levels and their grants
//!
//! None of them can be disabled.

pub mod command;
pub mod core;
pub mod module;
pub mod permissions;

use crate::application::context::CommandContext;
use crate::application::plugin::ModuleDescriptor;
use crate::application::response::ActionResult;

/// Built-in modules in load order.
pub fn core_modules() -> Vec<ModuleDescriptor> {
    vec![
        self::core::module(),
        self::module::module(),
        self::command::module(),
        self::permissions::module(),
    ]
}

/// A config action input, or a 400 carrying `missing`.
fn required_input<'a>(ctx: &'a CommandContext, name: &str, missing: &str) -> Result<&'a str, ActionResult> {
    ctx.input(name).ok_or_else(|| ActionResult::bad_request(missing))
}
