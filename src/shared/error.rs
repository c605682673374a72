//! Bot Error Types
//!
//! Centralized error taxonomy shared by the registries, the core services,
//! the dispatch pipeline and plugin handlers.

use std::error::Error as StdError;

/// Framework error type
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Module '{0}' could not be found. Has it been added to the bot?")]
    ModuleNotFound(String),

    #[error("The module '{0}' has already been added.")]
    ModuleAlreadyExists(String),

    #[error("The service '{0}' has already been added.")]
    ServiceAlreadyExists(String),

    #[error("The service '{0}' could not be found")]
    ServiceNotFound(String),

    #[error("Command {0} does not exist")]
    CommandNotFound(String),

    #[error("The command '{0}' has already been added.")]
    CommandAlreadyExists(String),

    #[error("Command {0} is required and can not be disabled.")]
    ReqCommand(String),

    #[error("{0}")]
    Module(String),

    #[error("{0}")]
    CommandState(String),

    #[error("{0}")]
    PermLevel(String),

    #[error("User '{0}' could not be found")]
    UserNotFound(String),

    #[error("Role {0} could not be found.")]
    RoleNotFound(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("{message}")]
    InvalidDescriptor { field: &'static str, message: String },

    #[error("Unknown response type {0}")]
    UnknownResponseType(String),

    #[error("Owner was not found.")]
    OwnerNotFound,

    #[error("Bot is not listening.")]
    NotListening,

    #[error("Bot runtime has shut down")]
    RuntimeGone,

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Command panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BotError {
    /// Build an `InvalidDescriptor` error for a missing descriptor field.
    pub fn invalid_descriptor(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            field,
            message: message.into(),
        }
    }

    /// Stable kind name, used in operator diagnostics and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModuleNotFound(_) => "ModuleNotFoundError",
            Self::ModuleAlreadyExists(_) => "ModuleAlreadyExistsError",
            Self::ServiceAlreadyExists(_) => "ServiceAlreadyExistsError",
            Self::ServiceNotFound(_) => "ServiceNotFoundError",
            Self::CommandNotFound(_) => "CommandNotFoundError",
            Self::CommandAlreadyExists(_) => "CommandAlreadyExistsError",
            Self::ReqCommand(_) => "ReqCommandError",
            Self::Module(_) => "ModuleError",
            Self::CommandState(_) => "CommandStateError",
            Self::PermLevel(_) => "PermLevelError",
            Self::UserNotFound(_) => "UserNotFoundError",
            Self::RoleNotFound(_) => "RoleNotFoundError",
            Self::InvalidConfig(_) => "InvalidConfigError",
            Self::InvalidDescriptor { .. } => "InvalidDescriptorError",
            Self::UnknownResponseType(_) => "UnknownResponseTypeError",
            Self::OwnerNotFound => "OwnerNotFoundError",
            Self::NotListening => "NotListeningError",
            Self::RuntimeGone => "RuntimeGoneError",
            Self::Platform(_) => "PlatformError",
            Self::Data(_) => "DataError",
            Self::Serialization(_) => "SerializationError",
            Self::Panic(_) => "PanicError",
            Self::Other(_) => "Error",
        }
    }

    /// Whether the error is a domain error whose message is safe to show
    /// to the user who invoked a config action.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::ModuleNotFound(_)
                | Self::CommandNotFound(_)
                | Self::ReqCommand(_)
                | Self::Module(_)
                | Self::CommandState(_)
                | Self::PermLevel(_)
                | Self::UserNotFound(_)
                | Self::RoleNotFound(_)
        )
    }

    /// Render the error and its source chain, one cause per line.
    pub fn chain(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.name(), self)];
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        if let Self::Other(inner) = self {
            // anyhow keeps its own chain behind `transparent`
            for cause in inner.chain().skip(1) {
                lines.push(format!("caused by: {}", cause));
            }
        }
        lines.dedup();
        lines.join("\n")
    }
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        Self::Data(err.to_string())
    }
}
