//! Command Service
//!
//! Command registry, per-guild prefixes and command enablement. The
//! dispatch pipeline lives in [`dispatch`].
//!
//! Enablement is stored under `core.enabledCommands` as a `{name: bool}` map
//! and is gated by the owning module: a command under a disabled module
//! reports disabled whatever its own flag says.

mod dispatch;

pub use dispatch::{DispatchOutcome, FilterOutcome, HaltReason};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::application::parser::CommandParser;
use crate::application::plugin::Command;
use crate::application::services::{Service, ServiceClass};
use crate::config::Settings;
use crate::domain::{Guild, GuildId, Message};
use crate::shared::error::BotError;
use crate::startup::BotHandle;

pub const ENABLED_COMMANDS_KEY: &str = "core.enabledCommands";
pub const COMMAND_PREFIX_KEY: &str = "core.commandPrefix";

/// Commands that can never be disabled.
pub const REQUIRED_COMMANDS: [&str; 2] = ["help", "config"];

/// Module whose commands are always enabled.
pub const CORE_MODULE: &str = "core";

#[derive(Default)]
struct CommandTable {
    order: Vec<Arc<Command>>,
    by_name: HashMap<String, Arc<Command>>,
}

pub struct CommandService {
    bot: BotHandle,
    commands: RwLock<CommandTable>,
    prefixes: DashMap<GuildId, String>,
    default_prefix: RwLock<String>,
}

impl ServiceClass for CommandService {
    const NAME: &'static str = "commandService";

    fn construct(bot: BotHandle) -> Self {
        Self {
            bot,
            commands: RwLock::new(CommandTable::default()),
            prefixes: DashMap::new(),
            default_prefix: RwLock::new(Settings::default().default_prefix),
        }
    }
}

#[async_trait]
impl Service for CommandService {
    /// Adopt the default prefix and check that every declared service
    /// dependency was registered.
    async fn configure_service(&self, settings: &Settings) -> Result<(), BotError> {
        *self.default_prefix.write() = settings.default_prefix.clone();

        let bot = self.bot.get()?;
        for command in self.commands() {
            for service in &command.services {
                if !bot.services().contains(&service.namespace, &service.name) {
                    tracing::error!(command = %command.name, service = %service.name, "command depends on a missing service");
                    return Err(BotError::ServiceNotFound(format!("{}.{}", service.namespace, service.name)));
                }
            }
        }
        Ok(())
    }

    /// Load the guild's configured prefix into the cache.
    async fn on_join_guild(&self, guild: &Guild) -> Result<(), BotError> {
        let stored: Option<String> = self.bot.get()?.data_service().get(guild.id, COMMAND_PREFIX_KEY).await?;
        if let Some(prefix) = stored.filter(|prefix| !prefix.is_empty()) {
            self.prefixes.insert(guild.id, prefix);
        }
        Ok(())
    }
}

impl CommandService {
    // ===== Registry =====

    pub fn add_command(&self, command: Arc<Command>) -> Result<(), BotError> {
        let key = command.name.to_lowercase();
        let mut table = self.commands.write();
        if table.by_name.contains_key(&key) {
            return Err(BotError::CommandAlreadyExists(command.name.clone()));
        }

        tracing::trace!(command = %command.name, module = %command.module_name, "command registered");
        table.by_name.insert(key, command.clone());
        table.order.push(command);
        Ok(())
    }

    pub fn command(&self, name: &str) -> Result<Arc<Command>, BotError> {
        self.commands
            .read()
            .by_name
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| BotError::CommandNotFound(name.to_string()))
    }

    /// All commands in registration order.
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.commands.read().order.clone()
    }

    // ===== Prefixes =====

    pub fn default_prefix(&self) -> String {
        self.default_prefix.read().clone()
    }

    /// The guild's prefix, or the default when it never set one.
    pub fn prefix(&self, guild_id: GuildId) -> String {
        self.prefixes
            .get(&guild_id)
            .map(|prefix| prefix.value().clone())
            .unwrap_or_else(|| self.default_prefix())
    }

    pub async fn set_prefix(&self, guild_id: GuildId, prefix: &str) -> Result<(), BotError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(BotError::CommandState("A prefix can not be empty.".into()));
        }

        self.bot.get()?.data_service().set(guild_id, COMMAND_PREFIX_KEY, &prefix).await?;
        self.prefixes.insert(guild_id, prefix.to_string());
        tracing::info!(%guild_id, prefix, "command prefix changed");
        Ok(())
    }

    /// Candidate prefixes: the channel's prefix, then both mention forms
    /// of the bot account.
    pub fn prefixes_for_message(&self, message: &Message) -> Vec<String> {
        let mut prefixes = vec![match &message.guild {
            Some(guild) => self.prefix(guild.id),
            None => self.default_prefix(),
        }];

        if let Some(me) = self.bot.get().ok().and_then(|bot| bot.bot_user()) {
            prefixes.push(format!("<@{}> ", me.id));
            prefixes.push(format!("<@!{}> ", me.id));
        }
        prefixes
    }

    /// Prefix matched and the command token names a registered command.
    pub fn msg_is_command(&self, message: &Message) -> bool {
        let prefixes = self.prefixes_for_message(message);
        CommandParser::command_name(&message.content, &prefixes)
            .is_some_and(|name| self.command(&name).is_ok())
    }

    // ===== Enablement =====

    pub async fn is_command_enabled(&self, guild_id: GuildId, name: &str) -> Result<bool, BotError> {
        let command = self.command(name)?;
        if Self::always_enabled(&command) {
            return Ok(true);
        }

        let bot = self.bot.get()?;
        if !bot.module_service().is_module_enabled(guild_id, &command.module_name).await? {
            return Ok(false);
        }

        if !command.can_be_disabled {
            return Ok(true);
        }
        self.own_flag(guild_id, &command).await
    }

    pub async fn enable_command(&self, guild_id: GuildId, name: &str) -> Result<bool, BotError> {
        self.set_command_enabled(guild_id, name, true).await
    }

    pub async fn disable_command(&self, guild_id: GuildId, name: &str) -> Result<bool, BotError> {
        self.set_command_enabled(guild_id, name, false).await
    }

    /// Core and required commands ignore both module and command state.
    fn always_enabled(command: &Command) -> bool {
        command.module_name.eq_ignore_ascii_case(CORE_MODULE)
            || REQUIRED_COMMANDS.iter().any(|required| command.name.eq_ignore_ascii_case(required))
    }

    async fn own_flag(&self, guild_id: GuildId, command: &Command) -> Result<bool, BotError> {
        let saved: HashMap<String, bool> = self
            .bot
            .get()?
            .data_service()
            .get(guild_id, ENABLED_COMMANDS_KEY)
            .await?
            .unwrap_or_default();
        Ok(saved.get(&command.name).copied().unwrap_or(command.enabled_by_default))
    }

    async fn set_command_enabled(&self, guild_id: GuildId, name: &str, enable: bool) -> Result<bool, BotError> {
        let command = self.command(name)?;

        if !enable {
            if REQUIRED_COMMANDS.iter().any(|required| command.name.eq_ignore_ascii_case(required)) {
                return Err(BotError::ReqCommand(command.name.clone()));
            }
            if Self::always_enabled(&command) || !command.can_be_disabled {
                return Err(BotError::CommandState(format!("Command {} can not be disabled.", command.name)));
            }
        }

        let data = self.bot.get()?.data_service();
        let _guard = data.lock_key(guild_id, ENABLED_COMMANDS_KEY).await;

        let current =
            Self::always_enabled(&command) || !command.can_be_disabled || self.own_flag(guild_id, &command).await?;
        if current == enable {
            let state = if enable { "enabled" } else { "disabled" };
            return Err(BotError::CommandState(format!("Command {} is already {}.", command.name, state)));
        }

        let mut saved: HashMap<String, bool> = data.get(guild_id, ENABLED_COMMANDS_KEY).await?.unwrap_or_default();
        saved.insert(command.name.clone(), enable);
        data.set(guild_id, ENABLED_COMMANDS_KEY, &saved).await?;

        tracing::info!(%guild_id, command = %command.name, enabled = enable, "command state changed");
        Ok(enable)
    }
}
