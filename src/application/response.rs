//! Outbound responses.
//!
//! A [`Response`] is bound to the message that triggered a command. Handlers
//! fill in its type and content, then call [`Response::send`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::{ChannelId, ChatPlatform, Embed, OutboundMessage, SendTarget, User};
use crate::shared::error::BotError;

// ===== Response Type =====

/// How a response is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// Send nothing
    None,
    /// Post in the originating channel, addressed to the author
    Reply,
    /// Post in the originating channel
    #[default]
    Message,
    /// Post an embed in the originating channel
    Embed,
    /// Direct-message the author
    Dm,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Reply => "reply",
            Self::Message => "message",
            Self::Embed => "embed",
            Self::Dm => "dm",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "reply" => Ok(Self::Reply),
            "message" => Ok(Self::Message),
            "embed" => Ok(Self::Embed),
            "dm" => Ok(Self::Dm),
            other => Err(BotError::UnknownResponseType(other.to_string())),
        }
    }
}

// ===== Response =====

/// Partial update merged into a response before sending.
#[derive(Debug, Clone, Default)]
pub struct ResponseData {
    pub response_type: Option<ResponseType>,
    pub content: Option<String>,
    pub embed: Option<Embed>,
}

/// Response bound to a triggering message.
pub struct Response {
    platform: Arc<dyn ChatPlatform>,
    channel_id: ChannelId,
    author: User,
    pub response_type: ResponseType,
    pub content: String,
    pub embed: Option<Embed>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("channel_id", &self.channel_id)
            .field("author", &self.author.id)
            .field("response_type", &self.response_type)
            .field("content", &self.content)
            .field("embed", &self.embed)
            .finish()
    }
}

impl Response {
    pub fn new(platform: Arc<dyn ChatPlatform>, channel_id: ChannelId, author: User) -> Self {
        Self {
            platform,
            channel_id,
            author,
            response_type: ResponseType::Message,
            content: String::new(),
            embed: None,
        }
    }

    /// Set the type from its string name.
    pub fn set_type(&mut self, name: &str) -> Result<(), BotError> {
        self.response_type = name.parse()?;
        Ok(())
    }

    /// Shorthand for a plain channel message.
    pub async fn send_message(&mut self, content: impl Into<String>) -> Result<(), BotError> {
        self.response_type = ResponseType::Message;
        self.content = content.into();
        self.send().await
    }

    /// Shorthand for an embed with optional lead-in text.
    pub async fn send_embed(&mut self, content: impl Into<String>, embed: Embed) -> Result<(), BotError> {
        self.response_type = ResponseType::Embed;
        self.content = content.into();
        self.embed = Some(embed);
        self.send().await
    }

    /// Merge `data` into the response, then send it.
    pub async fn send_with(&mut self, data: ResponseData) -> Result<(), BotError> {
        if let Some(response_type) = data.response_type {
            self.response_type = response_type;
        }
        if let Some(content) = data.content {
            self.content = content;
        }
        if data.embed.is_some() {
            self.embed = data.embed;
        }
        self.send().await
    }

    /// Deliver according to the current type.
    pub async fn send(&self) -> Result<(), BotError> {
        let channel = SendTarget::Channel(self.channel_id);

        let (target, message) = match self.response_type {
            ResponseType::None => return Ok(()),
            ResponseType::Message => (channel, OutboundMessage::text(&self.content)),
            ResponseType::Reply => (
                channel,
                OutboundMessage::text(format!("{}, {}", self.author.mention(), self.content)),
            ),
            ResponseType::Embed => (
                channel,
                OutboundMessage {
                    content: self.content.clone(),
                    embed: self.embed.clone(),
                },
            ),
            ResponseType::Dm => (
                SendTarget::User(self.author.id),
                OutboundMessage {
                    content: self.content.clone(),
                    embed: self.embed.clone(),
                },
            ),
        };

        tracing::trace!(response_type = %self.response_type, ?target, "sending response");
        self.platform.send(target, message).await
    }
}

// ===== Config Action Result =====

/// Status-coded result of a config action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub status: u16,
    pub content: String,
    pub embed: Option<Embed>,
}

impl ActionResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            status: 200,
            content: content.into(),
            embed: None,
        }
    }

    pub fn ok_embed(content: impl Into<String>, embed: Embed) -> Self {
        Self {
            status: 200,
            content: content.into(),
            embed: Some(embed),
        }
    }

    pub fn bad_request(content: impl Into<String>) -> Self {
        Self {
            status: 400,
            content: content.into(),
            embed: None,
        }
    }

    /// Turn a user-facing domain error into a 400; anything else propagates.
    pub fn from_domain_error(err: BotError) -> Result<Self, BotError> {
        if err.is_user_facing() {
            Ok(Self::bad_request(err.to_string()))
        } else {
            Err(err)
        }
    }
}
