//! Permission-level grant evaluation domain service.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Guild, Member};
use crate::domain::value_objects::{RoleId, UserId};

/// Users and roles granted one permission level in one guild.
///
/// Persisted as `{"users": [...], "roles": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevelData {
    #[serde(default)]
    pub users: BTreeSet<UserId>,

    #[serde(default)]
    pub roles: BTreeSet<RoleId>,
}

impl PermissionLevelData {
    /// Whether the member is granted this level directly or through a role.
    pub fn grants(&self, member: &Member) -> bool {
        self.users.contains(&member.user.id) || member.roles.iter().any(|role| self.roles.contains(role))
    }
}

/// Domain service for evaluating command permissions.
pub struct PermissionService;

impl PermissionService {
    /// The bot owner and the guild owner bypass every level.
    pub fn is_bypass(user_id: UserId, guild: &Guild, bot_owner: Option<UserId>) -> bool {
        bot_owner == Some(user_id) || guild.is_owner(user_id)
    }

    /// Evaluate a member against the levels a command requires.
    ///
    /// `required` holds one entry per level the command names; `None` marks
    /// a level that is not registered and therefore grants nobody.
    pub fn has_permission(
        member: &Member,
        guild: &Guild,
        bot_owner: Option<UserId>,
        required: &[Option<PermissionLevelData>],
    ) -> bool {
        if Self::is_bypass(member.user.id, guild, bot_owner) {
            return true;
        }

        if required.is_empty() {
            return true;
        }

        required
            .iter()
            .flatten()
            .any(|level| level.grants(member))
    }
}
