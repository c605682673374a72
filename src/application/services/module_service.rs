//! Module Service
//!
//! Per-guild module enablement and default data seeding.
//!
//! Enablement is stored under `core.enabledModules` as a `{name: bool}` map.
//! An absent entry falls back to the module's `enabled_by_default`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::plugin::Module;
use crate::application::services::{DataService, Service, ServiceClass};
use crate::domain::{Guild, GuildId};
use crate::shared::error::BotError;
use crate::startup::{Bot, BotHandle};

pub const ENABLED_MODULES_KEY: &str = "core.enabledModules";

pub struct ModuleService {
    bot: BotHandle,
}

impl ServiceClass for ModuleService {
    const NAME: &'static str = "moduleService";

    fn construct(bot: BotHandle) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Service for ModuleService {
    /// Replay `on_enabled` for every module enabled in the guild.
    async fn on_join_guild(&self, guild: &Guild) -> Result<(), BotError> {
        let bot = self.bot.get()?;
        for module in bot.modules() {
            if self.is_module_enabled(guild.id, &module.name).await? {
                module.hooks.on_enabled(&bot, guild.id).await?;
            }
        }
        Ok(())
    }
}

impl ModuleService {
    fn data(&self, bot: &Bot) -> Arc<DataService> {
        bot.data_service()
    }

    /// All registered modules in registration order.
    pub fn modules(&self) -> Result<Vec<Arc<Module>>, BotError> {
        Ok(self.bot.get()?.modules())
    }

    pub fn module(&self, name: &str) -> Result<Arc<Module>, BotError> {
        self.bot.get()?.module(name)
    }

    pub async fn is_module_enabled(&self, guild_id: GuildId, name: &str) -> Result<bool, BotError> {
        let bot = self.bot.get()?;
        let module = bot.module(name)?;
        if !module.can_be_disabled {
            return Ok(true);
        }

        let saved: HashMap<String, bool> = self
            .data(&bot)
            .get(guild_id, ENABLED_MODULES_KEY)
            .await?
            .unwrap_or_default();

        Ok(saved.get(&module.name).copied().unwrap_or(module.enabled_by_default))
    }

    /// Enable a module in a guild. Fails with `ModuleError` if it already is.
    pub async fn enable_module(&self, guild_id: GuildId, name: &str) -> Result<bool, BotError> {
        self.set_module_enabled(guild_id, name, true).await
    }

    /// Disable a module in a guild. Fails with `ModuleError` if it already
    /// is, or if the module can not be disabled.
    pub async fn disable_module(&self, guild_id: GuildId, name: &str) -> Result<bool, BotError> {
        self.set_module_enabled(guild_id, name, false).await
    }

    async fn set_module_enabled(&self, guild_id: GuildId, name: &str, enable: bool) -> Result<bool, BotError> {
        let bot = self.bot.get()?;
        let module = bot.module(name)?;

        if !enable && !module.can_be_disabled {
            return Err(BotError::Module(format!("The module '{}' can not be disabled", module.name)));
        }

        let data = self.data(&bot);
        let _guard = data.lock_key(guild_id, ENABLED_MODULES_KEY).await;

        if self.is_module_enabled(guild_id, &module.name).await? == enable {
            let state = if enable { "enabled" } else { "disabled" };
            return Err(BotError::Module(format!("Module {} is already {}.", module.name, state)));
        }

        let mut saved: HashMap<String, bool> = data.get(guild_id, ENABLED_MODULES_KEY).await?.unwrap_or_default();

        if enable {
            module.hooks.on_enabled(&bot, guild_id).await?;
        } else {
            module.hooks.on_disabled(&bot, guild_id).await?;
        }

        saved.insert(module.name.clone(), enable);
        data.set(guild_id, ENABLED_MODULES_KEY, &saved).await?;

        tracing::info!(%guild_id, module = %module.name, enabled = enable, "module state changed");
        Ok(enable)
    }

    /// Write each module's default data keys that the guild has not set.
    pub async fn prepare_default_data(&self, guild_id: GuildId) -> Result<(), BotError> {
        let bot = self.bot.get()?;
        let data = self.data(&bot);

        for module in bot.modules() {
            for default in &module.default_data {
                let _guard = data.lock_key(guild_id, &default.key).await;
                if data.get_guild_data(guild_id, &default.key).await?.is_none() {
                    data.set_guild_data(guild_id, &default.key, default.value.clone()).await?;
                    tracing::debug!(%guild_id, key = %default.key, "seeded default data");
                }
            }
        }
        Ok(())
    }
}
