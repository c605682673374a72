//! Member entity.

use serde::{Deserialize, Serialize};

use crate::domain::entities::User;
use crate::domain::value_objects::{GuildId, RoleId};

/// A user's membership in a guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Guild the membership belongs to
    pub guild_id: GuildId,

    /// The member's account
    pub user: User,

    /// Guild-specific nickname
    pub nickname: Option<String>,

    /// Role IDs assigned to the member
    pub roles: Vec<RoleId>,
}

impl Member {
    pub fn new(guild_id: impl Into<GuildId>, user: User) -> Self {
        Self {
            guild_id: guild_id.into(),
            user,
            ..Default::default()
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    /// Check if member has a specific role.
    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.roles.contains(&role_id)
    }

    /// Name shown in the guild: nickname if set, else username.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.username)
    }
}
