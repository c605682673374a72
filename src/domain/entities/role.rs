//! Role entity.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{GuildId, RoleId};

/// A named role inside a guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Snowflake ID
    pub id: RoleId,

    /// Guild the role belongs to
    pub guild_id: GuildId,

    /// Role name (1-100 characters)
    pub name: String,
}

impl Role {
    pub fn new(id: impl Into<RoleId>, guild_id: impl Into<GuildId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            guild_id: guild_id.into(),
            name: name.into(),
        }
    }

    /// Inline mention markup.
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}
