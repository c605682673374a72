//! Permissions Service
//!
//! Named permission levels and their per-guild grants. A level's grants are
//! stored under `core.permissions.<level>` as `{users: [...], roles: [...]}`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::application::context::CommandContext;
use crate::application::plugin::Command;
use crate::application::services::{DataService, Service, ServiceClass};
use crate::domain::services::{PermissionLevelData, PermissionService};
use crate::domain::{Guild, GuildId, Member, Role, User};
use crate::shared::error::BotError;
use crate::startup::BotHandle;

pub fn permission_key(level: &str) -> String {
    format!("core.permissions.{}", level)
}

pub struct PermissionsService {
    bot: BotHandle,
    levels: RwLock<Vec<String>>,
}

impl ServiceClass for PermissionsService {
    const NAME: &'static str = "permissionsService";

    fn construct(bot: BotHandle) -> Self {
        Self {
            bot,
            levels: RwLock::new(Vec::new()),
        }
    }
}

impl Service for PermissionsService {}

impl PermissionsService {
    fn data(&self) -> Result<Arc<DataService>, BotError> {
        Ok(self.bot.get()?.data_service())
    }

    /// Declare a level. Declaring an existing level again is a no-op.
    pub fn add_permission_level(&self, level: &str) {
        let mut levels = self.levels.write();
        if !levels.iter().any(|known| known.eq_ignore_ascii_case(level)) {
            tracing::trace!(level, "permission level registered");
            levels.push(level.to_string());
        }
    }

    /// Declared levels in declaration order.
    pub fn levels(&self) -> Vec<String> {
        self.levels.read().clone()
    }

    /// Canonical spelling of a declared level.
    pub fn level(&self, name: &str) -> Option<String> {
        self.levels
            .read()
            .iter()
            .find(|known| known.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn require_level(&self, name: &str) -> Result<String, BotError> {
        self.level(name)
            .ok_or_else(|| BotError::PermLevel(format!("Permission level {} does not exist.", name)))
    }

    /// Grants for a declared level; empty when nothing was stored.
    pub async fn permission_data(&self, guild_id: GuildId, level: &str) -> Result<PermissionLevelData, BotError> {
        let level = self.require_level(level)?;
        Ok(self
            .data()?
            .get(guild_id, &permission_key(&level))
            .await?
            .unwrap_or_default())
    }

    /// Dispatch filter: may the invoking member run the context's command?
    pub async fn filter_has_permission(&self, ctx: &CommandContext) -> Result<bool, BotError> {
        let allowed = self.has_permission(&ctx.guild, &ctx.member, &ctx.command).await?;
        tracing::debug!(command = %ctx.command.name, user_id = %ctx.member.user.id, allowed, "filter_has_permission");
        Ok(allowed)
    }

    pub async fn has_permission(&self, guild: &Guild, member: &Member, command: &Command) -> Result<bool, BotError> {
        let owner = self.bot.get()?.owner().map(|owner| owner.id);

        if PermissionService::is_bypass(member.user.id, guild, owner) || command.permissions.is_empty() {
            return Ok(true);
        }

        let mut required = Vec::with_capacity(command.permissions.len());
        for level in &command.permissions {
            match self.level(level) {
                Some(level) => required.push(Some(self.permission_data(guild.id, &level).await?)),
                None => {
                    tracing::warn!(command = %command.name, level = %level, "command requires an unknown permission level");
                    required.push(None);
                }
            }
        }

        Ok(PermissionService::has_permission(member, guild, owner, &required))
    }

    pub async fn add_role(&self, guild_id: GuildId, level: &str, role: &Role) -> Result<(), BotError> {
        self.update(guild_id, level, |data| {
            data.roles.insert(role.id);
        })
        .await
    }

    pub async fn remove_role(&self, guild_id: GuildId, level: &str, role: &Role) -> Result<(), BotError> {
        self.update(guild_id, level, |data| {
            data.roles.remove(&role.id);
        })
        .await
    }

    pub async fn add_user(&self, guild_id: GuildId, level: &str, user: &User) -> Result<(), BotError> {
        self.update(guild_id, level, |data| {
            data.users.insert(user.id);
        })
        .await
    }

    pub async fn remove_user(&self, guild_id: GuildId, level: &str, user: &User) -> Result<(), BotError> {
        self.update(guild_id, level, |data| {
            data.users.remove(&user.id);
        })
        .await
    }

    async fn update<F>(&self, guild_id: GuildId, level: &str, change: F) -> Result<(), BotError>
    where
        F: FnOnce(&mut PermissionLevelData),
    {
        let level = self.require_level(level)?;
        let key = permission_key(&level);
        let data = self.data()?;

        let _guard = data.lock_key(guild_id, &key).await;
        let mut grants: PermissionLevelData = data.get(guild_id, &key).await?.unwrap_or_default();
        change(&mut grants);
        data.set(guild_id, &key, &grants).await?;

        tracing::info!(%guild_id, level = %level, "permission level updated");
        Ok(())
    }
}
