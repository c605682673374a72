//! Plugin contracts.
//!
//! Everything a plugin author declares: modules, commands, config actions,
//! and the lifecycle hooks a module may implement.

mod command;
mod config_action;
mod module;

pub use command::*;
pub use config_action::*;
pub use module::*;

/// Reference to a registered service by namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
}

impl ServiceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}
