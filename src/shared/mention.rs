//! Mention markup parsing.
//!
//! Platforms encode mentions inline: `<@123>` or `<@!123>` for users and
//! `<@&123>` for roles.

use crate::domain::value_objects::Snowflake;

/// Extract a user id from `<@id>`, `<@!id>` or a bare id.
pub fn parse_user_mention(text: &str) -> Option<Snowflake> {
    let text = text.trim();
    let inner = text
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|rest| rest.strip_prefix('!').unwrap_or(rest));

    match inner {
        Some(id) if !id.starts_with('&') => id.parse().ok(),
        Some(_) => None,
        None => text.parse().ok(),
    }
}

/// Extract a role id from `<@&id>` or a bare id.
pub fn parse_role_mention(text: &str) -> Option<Snowflake> {
    let text = text.trim();
    match text.strip_prefix("<@&").and_then(|rest| rest.strip_suffix('>')) {
        Some(id) => id.parse().ok(),
        None => text.parse().ok(),
    }
}
