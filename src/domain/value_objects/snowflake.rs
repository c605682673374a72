//! Platform Snowflake identifiers.
//!
//! Users, guilds, roles and channels are all identified by 64-bit ids the
//! chat platform assigns. The top 42 bits carry a millisecond timestamp
//! relative to the platform epoch.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform epoch: 2015-01-01T00:00:00Z in milliseconds
pub const PLATFORM_EPOCH: u64 = 1420070400000;

/// A platform-assigned identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

pub type UserId = Snowflake;
pub type GuildId = Snowflake;
pub type RoleId = Snowflake;
pub type ChannelId = Snowflake;

impl Snowflake {
    /// Create a new Snowflake from raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Creation time encoded in the id.
    pub fn created_at(&self) -> DateTime<Utc> {
        let millis = (self.0 >> 22) + PLATFORM_EPOCH;
        Utc.timestamp_millis_opt(millis as i64)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
