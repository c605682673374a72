//! Inbound message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Channel, Guild, Member, User};
use crate::domain::value_objects::Snowflake;

/// A chat message delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake ID
    pub id: Snowflake,

    /// Raw text content
    pub content: String,

    /// Author account
    pub author: User,

    /// Channel the message was posted in
    pub channel: Channel,

    /// Guild snapshot, `None` for direct messages
    pub guild: Option<Guild>,

    /// Author's guild membership, `None` for direct messages
    pub member: Option<Member>,

    /// Receive timestamp
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// A message posted in a guild text channel.
    pub fn in_guild(id: impl Into<Snowflake>, content: impl Into<String>, member: Member, channel: Channel, guild: Guild) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            author: member.user.clone(),
            channel,
            guild: Some(guild),
            member: Some(member),
            received_at: Utc::now(),
        }
    }

    /// A direct message.
    pub fn direct(id: impl Into<Snowflake>, content: impl Into<String>, author: User, channel: Channel) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            author,
            channel,
            guild: None,
            member: None,
            received_at: Utc::now(),
        }
    }
}
