//! User Service
//!
//! Resolves free-text user and role references typed by guild members:
//! mentions, raw ids, tags, nicknames or names.

use crate::application::services::{Service, ServiceClass};
use crate::domain::{Guild, Member, Role, User};
use crate::shared::error::BotError;
use crate::shared::mention::{parse_role_mention, parse_user_mention};
use crate::startup::BotHandle;

pub struct UserService {
    bot: BotHandle,
}

impl ServiceClass for UserService {
    const NAME: &'static str = "userService";

    fn construct(bot: BotHandle) -> Self {
        Self { bot }
    }
}

impl Service for UserService {}

impl UserService {
    /// Find a guild member. Fails with `UserNotFound`.
    pub async fn find_member(&self, guild: &Guild, query: &str) -> Result<Member, BotError> {
        let members = self.bot.get()?.platform().members(guild.id).await?;
        let query = query.trim();

        let found = match parse_user_mention(query) {
            Some(id) => members.into_iter().find(|member| member.user.id == id),
            None => {
                let needle = query.to_lowercase();
                members.into_iter().find(|member| {
                    member.user.tag().to_lowercase() == needle
                        || member.user.username.to_lowercase() == needle
                        || member.nickname.as_deref().is_some_and(|nick| nick.to_lowercase() == needle)
                })
            }
        };

        found.ok_or_else(|| BotError::UserNotFound(query.to_string()))
    }

    /// Any platform user by id or mention. Fails with `UserNotFound`.
    pub async fn find_user(&self, query: &str) -> Result<User, BotError> {
        let id = parse_user_mention(query).ok_or_else(|| BotError::UserNotFound(query.to_string()))?;
        self.bot
            .get()?
            .platform()
            .fetch_user(id)
            .await
            .map_err(|_| BotError::UserNotFound(query.to_string()))
    }

    /// Find a guild role. Fails with `RoleNotFound`.
    pub async fn find_role(&self, guild: &Guild, query: &str) -> Result<Role, BotError> {
        let roles = self.bot.get()?.platform().roles(guild.id).await?;
        let query = query.trim();

        let found = match parse_role_mention(query) {
            Some(id) => roles.into_iter().find(|role| role.id == id),
            None => roles.into_iter().find(|role| role.name.eq_ignore_ascii_case(query)),
        };

        found.ok_or_else(|| BotError::RoleNotFound(query.to_string()))
    }
}
