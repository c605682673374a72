//! Guild Data Stores
//!
//! Implementations of [`GuildDataRepository`](crate::domain::GuildDataRepository):
//! - `MemoryGuildData`: process-local, lost on exit
//! - `JsonFileGuildData`: one JSON document on disk, rewritten on every write

mod json_file;
mod memory;

pub use json_file::JsonFileGuildData;
pub use memory::MemoryGuildData;

use std::sync::Arc;

use crate::config::{DataSourceKind, DataSourceSettings};
use crate::domain::GuildDataRepository;
use crate::shared::error::BotError;

/// Open the store selected by `dataSource`.
pub async fn open_data_source(settings: &DataSourceSettings) -> Result<Arc<dyn GuildDataRepository>, BotError> {
    match settings.kind {
        DataSourceKind::Memory => Ok(Arc::new(MemoryGuildData::new())),
        DataSourceKind::JsonFile => {
            let path = settings
                .path
                .as_deref()
                .ok_or_else(|| BotError::InvalidConfig("dataSource.path is required for json_file".into()))?;
            Ok(Arc::new(JsonFileGuildData::open(path).await?))
        }
    }
}
