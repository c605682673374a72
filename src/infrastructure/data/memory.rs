use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::domain::{GuildDataRepository, GuildId};
use crate::shared::error::BotError;

/// In-memory guild data.
#[derive(Debug, Default)]
pub struct MemoryGuildData {
    entries: DashMap<(GuildId, String), Value>,
}

impl MemoryGuildData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl GuildDataRepository for MemoryGuildData {
    async fn get_guild_data(&self, guild_id: GuildId, key: &str) -> Result<Option<Value>, BotError> {
        Ok(self
            .entries
            .get(&(guild_id, key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn set_guild_data(&self, guild_id: GuildId, key: &str, value: Value) -> Result<Value, BotError> {
        self.entries.insert((guild_id, key.to_string()), value.clone());
        Ok(value)
    }
}
