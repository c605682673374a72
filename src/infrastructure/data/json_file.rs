//! JSON file guild data.
//!
//! Layout:
//!
//! ```text
//! {
//!   "<guild id>": { "core.commandPrefix": "?", "core.enabledModules": {...} },
//!   ...
//! }
//! ```
//!
//! The whole document lives in memory and is rewritten on each write
//! (temp file, then rename).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::{GuildDataRepository, GuildId};
use crate::shared::error::BotError;

type Document = HashMap<String, Map<String, Value>>;

#[derive(Debug)]
pub struct JsonFileGuildData {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonFileGuildData {
    /// Load the file, or start empty when it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let path = path.as_ref().to_path_buf();

        let document = match fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => Document::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Document::new(),
            Err(err) => return Err(err.into()),
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        tracing::info!(path = %path.display(), guilds = document.len(), "opened guild data file");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, document: &Document) -> Result<(), BotError> {
        let json = serde_json::to_vec_pretty(document)?;
        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, &json).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl GuildDataRepository for JsonFileGuildData {
    async fn get_guild_data(&self, guild_id: GuildId, key: &str) -> Result<Option<Value>, BotError> {
        let document = self.document.lock().await;
        Ok(document
            .get(&guild_id.to_string())
            .and_then(|guild| guild.get(key))
            .cloned())
    }

    async fn set_guild_data(&self, guild_id: GuildId, key: &str, value: Value) -> Result<Value, BotError> {
        let mut document = self.document.lock().await;
        let guild_key = guild_id.to_string();
        let previous = document
            .entry(guild_key.clone())
            .or_default()
            .insert(key.to_string(), value.clone());

        if let Err(err) = self.flush(&document).await {
            // Memory must keep matching the file.
            if let Some(guild) = document.get_mut(&guild_key) {
                match previous {
                    Some(previous) => {
                        guild.insert(key.to_string(), previous);
                    }
                    None => {
                        guild.remove(key);
                    }
                }
                if guild.is_empty() {
                    document.remove(&guild_key);
                }
            }
            tracing::error!(path = %self.path.display(), %guild_id, key, error = %err, "could not write guild data");
            return Err(err);
        }
        Ok(value)
    }
}
