//! User entity.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::UserId;

/// A platform account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Snowflake ID
    pub id: UserId,

    /// Account name
    pub username: String,

    /// Legacy four digit discriminator, if the platform still uses one
    pub discriminator: Option<String>,

    /// Whether the account is a bot
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// `name#1234`, or just the name when there is no discriminator.
    pub fn tag(&self) -> String {
        match &self.discriminator {
            Some(disc) => format!("{}#{}", self.username, disc),
            None => self.username.clone(),
        }
    }

    /// Inline mention markup.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}
