//! Data Service
//!
//! Per-guild key/value persistence on top of a [`GuildDataRepository`].
//! Read-modify-write sequences take a per-(guild, key) lock so concurrent
//! updates to the same key cannot interleave.

use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::services::{Service, ServiceClass};
use crate::domain::{GuildDataRepository, GuildId};
use crate::shared::error::BotError;
use crate::startup::BotHandle;

pub struct DataService {
    bot: BotHandle,
    locks: DashMap<(GuildId, String), Arc<Mutex<()>>>,
}

impl ServiceClass for DataService {
    const NAME: &'static str = "dataService";

    fn construct(bot: BotHandle) -> Self {
        Self {
            bot,
            locks: DashMap::new(),
        }
    }
}

impl Service for DataService {}

impl DataService {
    fn store(&self) -> Result<Arc<dyn GuildDataRepository>, BotError> {
        Ok(self.bot.get()?.data_store())
    }

    /// Raw value, `None` when the key was never written.
    pub async fn get_guild_data(&self, guild_id: GuildId, key: &str) -> Result<Option<Value>, BotError> {
        self.store()?.get_guild_data(guild_id, key).await
    }

    pub async fn set_guild_data(&self, guild_id: GuildId, key: &str, value: Value) -> Result<Value, BotError> {
        tracing::trace!(%guild_id, key, "writing guild data");
        self.store()?.set_guild_data(guild_id, key, value).await
    }

    /// Typed read.
    pub async fn get<T: DeserializeOwned>(&self, guild_id: GuildId, key: &str) -> Result<Option<T>, BotError> {
        match self.get_guild_data(guild_id, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Typed write.
    pub async fn set<T: Serialize>(&self, guild_id: GuildId, key: &str, value: &T) -> Result<(), BotError> {
        self.set_guild_data(guild_id, key, serde_json::to_value(value)?).await?;
        Ok(())
    }

    /// Serialize access to one key of one guild until the guard drops.
    pub async fn lock_key(&self, guild_id: GuildId, key: &str) -> OwnedMutexGuard<()> {
        // Entries only the map still references are neither held nor awaited.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);

        let lock = self
            .locks
            .entry((guild_id, key.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
