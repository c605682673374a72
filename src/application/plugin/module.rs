//! Modules: the unit of plugin packaging.
//!
//! A module bundles services, commands, config actions, permission levels
//! and default guild data under one case-insensitive name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::application::plugin::{Command, CommandDescriptor, ConfigAction, ConfigActionDescriptor};
use crate::application::services::{ServiceClass, ServiceEntry};
use crate::domain::{Guild, GuildId};
use crate::shared::error::BotError;
use crate::startup::Bot;

/// Optional lifecycle hooks. Every hook defaults to a no-op.
#[async_trait]
pub trait ModuleHooks: Send + Sync {
    /// The module was enabled in a guild (also replayed on guild join).
    async fn on_enabled(&self, _bot: &Arc<Bot>, _guild_id: GuildId) -> Result<(), BotError> {
        Ok(())
    }

    /// The module was disabled in a guild.
    async fn on_disabled(&self, _bot: &Arc<Bot>, _guild_id: GuildId) -> Result<(), BotError> {
        Ok(())
    }

    /// The bot finished connecting.
    async fn on_listen(&self, _bot: &Arc<Bot>) -> Result<(), BotError> {
        Ok(())
    }

    /// The bot joined (or started up in) a guild.
    async fn on_join_guild(&self, _bot: &Arc<Bot>, _guild: &Guild) -> Result<(), BotError> {
        Ok(())
    }
}

/// Hooks for modules that need none.
pub struct NoHooks;

impl ModuleHooks for NoHooks {}

/// A guild data key seeded when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultData {
    pub key: String,
    pub value: Value,
}

// ===== Descriptor =====

#[derive(Clone)]
pub struct ModuleDescriptor {
    pub name: String,
    pub description: String,
    pub services: Vec<ServiceEntry>,
    pub commands: Vec<CommandDescriptor>,
    pub config_actions: Vec<ConfigActionDescriptor>,
    pub permission_levels: Vec<String>,
    pub default_data: Vec<DefaultData>,
    pub can_be_disabled: bool,
    pub enabled_by_default: bool,
    pub hooks: Arc<dyn ModuleHooks>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            services: Vec::new(),
            commands: Vec::new(),
            config_actions: Vec::new(),
            permission_levels: Vec::new(),
            default_data: Vec::new(),
            can_be_disabled: true,
            enabled_by_default: true,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn service<S: ServiceClass>(mut self) -> Self {
        self.services.push(ServiceEntry::of::<S>());
        self
    }

    pub fn command(mut self, command: CommandDescriptor) -> Self {
        self.commands.push(command);
        self
    }

    pub fn config_action(mut self, action: ConfigActionDescriptor) -> Self {
        self.config_actions.push(action);
        self
    }

    pub fn permission_level(mut self, level: impl Into<String>) -> Self {
        self.permission_levels.push(level.into());
        self
    }

    pub fn default_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.default_data.push(DefaultData { key: key.into(), value });
        self
    }

    pub fn can_be_disabled(mut self, can_be_disabled: bool) -> Self {
        self.can_be_disabled = can_be_disabled;
        self
    }

    pub fn enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    pub fn hooks(mut self, hooks: impl ModuleHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }
}

// ===== Module =====

/// A validated module. Immutable once registered.
pub struct Module {
    pub name: String,
    pub description: String,
    pub services: Vec<ServiceEntry>,
    pub commands: Vec<Arc<Command>>,
    pub config_actions: Vec<Arc<ConfigAction>>,
    pub permission_levels: Vec<String>,
    pub default_data: Vec<DefaultData>,
    pub can_be_disabled: bool,
    pub enabled_by_default: bool,
    pub hooks: Arc<dyn ModuleHooks>,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("services", &self.services)
            .field("commands", &self.commands.iter().map(|c| &c.name).collect::<Vec<_>>())
            .field("config_actions", &self.config_actions.iter().map(|a| &a.name).collect::<Vec<_>>())
            .field("permission_levels", &self.permission_levels)
            .field("can_be_disabled", &self.can_be_disabled)
            .field("enabled_by_default", &self.enabled_by_default)
            .finish_non_exhaustive()
    }
}

impl Module {
    /// Validate the module and everything it declares.
    pub fn from_descriptor(descriptor: ModuleDescriptor) -> Result<Self, BotError> {
        if descriptor.name.trim().is_empty() {
            return Err(BotError::invalid_descriptor("name", "Name for module is missing."));
        }
        let name = descriptor.name;

        let commands = descriptor
            .commands
            .into_iter()
            .map(|command| Command::from_descriptor(command, Some(&name)).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let config_actions = descriptor
            .config_actions
            .into_iter()
            .map(|action| ConfigAction::from_descriptor(action, &name).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            description: descriptor.description,
            services: descriptor.services,
            commands,
            config_actions,
            permission_levels: descriptor.permission_levels,
            default_data: descriptor.default_data,
            can_be_disabled: descriptor.can_be_disabled,
            enabled_by_default: descriptor.enabled_by_default,
            hooks: descriptor.hooks,
        })
    }
}

// ===== Registry =====

#[derive(Default)]
struct RegistryInner {
    order: Vec<Arc<Module>>,
    by_name: HashMap<String, Arc<Module>>,
}

/// Case-insensitive module registry preserving registration order.
#[derive(Default)]
pub struct ModuleRegistry {
    inner: RwLock<RegistryInner>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, module: Module) -> Result<Arc<Module>, BotError> {
        let key = module.name.to_lowercase();
        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&key) {
            return Err(BotError::ModuleAlreadyExists(module.name));
        }

        let module = Arc::new(module);
        inner.by_name.insert(key, module.clone());
        inner.order.push(module.clone());
        Ok(module)
    }

    pub fn get(&self, name: &str) -> Result<Arc<Module>, BotError> {
        self.inner
            .read()
            .by_name
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| BotError::ModuleNotFound(name.to_string()))
    }

    /// All modules in registration order.
    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.inner.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
