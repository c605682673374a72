//! Bot settings and configuration structures.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::config::ResponseStrings;
use crate::domain::value_objects::UserId;
use crate::shared::error::BotError;

/// Root configuration structure containing all bot settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Account that receives diagnostics and bypasses every permission level
    pub owner_user_id: Option<UserId>,

    /// Platform login token
    pub login_token: Option<String>,

    /// Command prefix used when a guild has not configured its own
    pub default_prefix: String,

    /// DM the owner once the bot is online
    pub message_owner_on_boot: bool,

    /// Guild data persistence
    pub data_source: DataSourceSettings,

    /// Log output
    pub logger: LoggerSettings,

    /// User-facing string overrides
    #[serde(default)]
    pub response_strings: ResponseStrings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Guild data backend selection.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceSettings {
    /// Backend kind
    #[serde(rename = "type")]
    pub kind: DataSourceKind,

    /// File path, used by the `json_file` backend
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Memory,
    JsonFile,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner_user_id: None,
            login_token: None,
            default_prefix: "!".into(),
            message_owner_on_boot: true,
            data_source: DataSourceSettings::default(),
            logger: LoggerSettings::default(),
            response_strings: ResponseStrings::default(),
            environment: "development".into(),
        }
    }
}

impl Default for DataSourceSettings {
    fn default() -> Self {
        Self {
            kind: DataSourceKind::Memory,
            path: None,
        }
    }
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            filter: "info,botframe=debug".into(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if configuration cannot be loaded or parsed,
    /// or if a required field is missing.
    pub fn load() -> Result<Self, BotError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let settings: Self = Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("default_prefix", "!")?
            .set_default("message_owner_on_boot", true)?
            .set_default("data_source.type", "memory")?
            .set_default("logger.filter", "info,botframe=debug")?
            .set_default("logger.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__DEFAULT_PREFIX=? -> default_prefix = "?"
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("owner_user_id", std::env::var("BOT_OWNER_ID").ok())?
            .set_override_option("login_token", std::env::var("BOT_TOKEN").ok())?
            .build()?
            .try_deserialize()?;

        settings.verify()?;
        Ok(settings)
    }

    /// Check required fields.
    pub fn verify(&self) -> Result<(), BotError> {
        if self.owner_user_id.is_none() {
            return Err(BotError::InvalidConfig("ownerUserId is required".into()));
        }
        if self.login_token.as_deref().map_or(true, str::is_empty) {
            return Err(BotError::InvalidConfig("loginToken is required".into()));
        }
        if self.data_source.kind == DataSourceKind::JsonFile && self.data_source.path.is_none() {
            return Err(BotError::InvalidConfig("dataSource.path is required for json_file".into()));
        }
        Ok(())
    }
}
