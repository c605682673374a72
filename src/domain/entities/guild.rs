//! Guild entity and guild data repository trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{GuildId, UserId};
use crate::shared::error::BotError;

/// A community the bot is a member of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Snowflake ID
    pub id: GuildId,

    /// Guild name
    pub name: String,

    /// User ID of the guild owner
    pub owner_id: UserId,
}

impl Guild {
    pub fn new(id: impl Into<GuildId>, name: impl Into<String>, owner_id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
        }
    }

    /// Check if a user is the owner of this guild.
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}

/// Repository trait for per-guild key/value data.
///
/// Keys are dotted strings such as `core.enabledModules`. Values are
/// arbitrary JSON.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuildDataRepository: Send + Sync {
    /// Read a value, `None` when the key was never written.
    async fn get_guild_data(&self, guild_id: GuildId, key: &str) -> Result<Option<Value>, BotError>;

    /// Write a value and return what was stored.
    async fn set_guild_data(&self, guild_id: GuildId, key: &str, value: Value) -> Result<Value, BotError>;
}
