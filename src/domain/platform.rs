//! Chat platform port.
//!
//! The framework only needs a narrow slice of a chat platform: log in, look
//! up users/members/roles, check whether it may post in a channel, send
//! messages, and receive a stream of events.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Channel, Guild, Member, Message, Role, User};
use crate::domain::value_objects::{ChannelId, Embed, GuildId, UserId};
use crate::shared::error::BotError;

/// Events the platform pushes to the bot.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// A message was posted somewhere the bot can see
    MessageReceived(Message),
    /// The bot was added to a guild
    GuildJoined(Guild),
}

/// Where an outbound message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SendTarget {
    Channel(ChannelId),
    User(UserId),
}

/// A message the bot sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
        }
    }

    pub fn with_embed(content: impl Into<String>, embed: Embed) -> Self {
        Self {
            content: content.into(),
            embed: Some(embed),
        }
    }
}

/// Platform client contract.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Authenticate and return the bot's own account.
    async fn login(&self, token: &str) -> Result<User, BotError>;

    /// Fetch any user by id.
    async fn fetch_user(&self, user_id: UserId) -> Result<User, BotError>;

    /// Guilds the bot is currently a member of.
    async fn guilds(&self) -> Result<Vec<Guild>, BotError>;

    /// Members of a guild.
    async fn members(&self, guild_id: GuildId) -> Result<Vec<Member>, BotError>;

    /// Roles of a guild.
    async fn roles(&self, guild_id: GuildId) -> Result<Vec<Role>, BotError>;

    /// Whether the bot may post in the channel.
    async fn can_send(&self, channel: &Channel) -> Result<bool, BotError>;

    /// Deliver a message.
    async fn send(&self, target: SendTarget, message: OutboundMessage) -> Result<(), BotError>;

    /// Event stream. Called once per `listen`.
    fn events(&self) -> BoxStream<'static, PlatformEvent>;

    /// Disconnect and release the session.
    async fn destroy(&self) -> Result<(), BotError>;
}
