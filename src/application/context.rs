//! Command execution context.

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::plugin::{Command, FlagValue};
use crate::application::services::Service;
use crate::domain::{Channel, Guild, Member, Message, User};
use crate::shared::error::BotError;
use crate::startup::Bot;

/// Everything a handler sees about one invocation.
#[derive(Clone)]
pub struct CommandContext {
    pub bot: Arc<Bot>,
    pub message: Message,
    pub guild: Guild,
    pub member: Member,
    pub command: Arc<Command>,
    pub args: HashMap<String, String>,
    pub flags: HashMap<String, FlagValue>,
    /// Named config action inputs, empty for plain commands
    pub inputs: HashMap<String, String>,
}

impl CommandContext {
    pub fn channel(&self) -> &Channel {
        &self.message.channel
    }

    pub fn user(&self) -> &User {
        &self.message.author
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }

    /// Whether a flag is set and truthy.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(FlagValue::as_bool)
    }

    pub fn flag_value(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    pub fn input(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(String::as_str).filter(|value| !value.is_empty())
    }

    /// Copy of this context carrying config action inputs.
    pub fn with_inputs(&self, inputs: HashMap<String, String>) -> Self {
        Self {
            inputs,
            ..self.clone()
        }
    }

    /// Resolve a registered service.
    pub fn service<S: Service>(&self, namespace: &str, name: &str) -> Result<Arc<S>, BotError> {
        self.bot.service::<S>(namespace, name)
    }

    /// Prefix in effect for this guild.
    pub fn prefix(&self) -> String {
        self.bot.command_service().prefix(self.guild.id)
    }
}
