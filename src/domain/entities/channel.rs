//! Channel entity.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ChannelId, GuildId};

/// Channel kinds the platform reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// A text channel within a guild
    #[default]
    Text,
    /// A voice channel within a guild
    Voice,
    /// A category that contains channels
    Category,
    /// A direct message between two users
    Dm,
    /// A direct message between multiple users
    GroupDm,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Category => "category",
            Self::Dm => "dm",
            Self::GroupDm => "group_dm",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A conversation messages arrive in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Snowflake ID
    pub id: ChannelId,

    /// Owning guild, `None` for direct messages
    pub guild_id: Option<GuildId>,

    /// Channel name
    pub name: String,

    /// Channel type
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
}

impl Channel {
    /// A guild text channel.
    pub fn text(id: impl Into<ChannelId>, guild_id: impl Into<GuildId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            guild_id: Some(guild_id.into()),
            name: name.into(),
            channel_type: ChannelType::Text,
        }
    }

    /// A direct-message channel.
    pub fn dm(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            guild_id: None,
            name: String::new(),
            channel_type: ChannelType::Dm,
        }
    }

    /// Check if this is a guild text channel.
    pub fn is_text(&self) -> bool {
        self.channel_type == ChannelType::Text && self.guild_id.is_some()
    }

    /// Check if this is a DM channel.
    pub fn is_dm(&self) -> bool {
        matches!(self.channel_type, ChannelType::Dm | ChannelType::GroupDm)
    }
}
