//! Config action descriptors.
//!
//! Config actions are the per-module settings operations reachable through
//! `config <module> <action> [inputs...]`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::plugin::ServiceRef;
use crate::application::response::ActionResult;
use crate::shared::error::BotError;

/// Named input of a config action.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl InputSpec {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, description)
        }
    }
}

/// Config action behavior. Inputs are available through `ctx.inputs`.
#[async_trait]
pub trait ConfigActionHandler: Send + Sync {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError>;
}

#[derive(Clone, Default)]
pub struct ConfigActionDescriptor {
    pub name: String,
    pub description: String,
    pub inputs: Vec<InputSpec>,
    pub run: Option<Arc<dyn ConfigActionHandler>>,
    pub services: Vec<ServiceRef>,
}

impl ConfigActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn run(mut self, handler: impl ConfigActionHandler + 'static) -> Self {
        self.run = Some(Arc::new(handler));
        self
    }

    pub fn service(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.services.push(ServiceRef::new(namespace, name));
        self
    }
}

/// A validated config action owned by a module.
pub struct ConfigAction {
    pub name: String,
    pub module_name: String,
    pub description: String,
    pub inputs: Vec<InputSpec>,
    pub handler: Arc<dyn ConfigActionHandler>,
    pub services: Vec<ServiceRef>,
}

impl fmt::Debug for ConfigAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigAction")
            .field("name", &self.name)
            .field("module_name", &self.module_name)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

impl ConfigAction {
    pub fn from_descriptor(descriptor: ConfigActionDescriptor, module_name: &str) -> Result<Self, BotError> {
        if descriptor.name.trim().is_empty() {
            return Err(BotError::invalid_descriptor(
                "name",
                format!("Name for a config action of module {} is missing.", module_name),
            ));
        }

        let handler = descriptor.run.ok_or_else(|| {
            BotError::invalid_descriptor(
                "run",
                format!("run function for config action {} is missing.", descriptor.name),
            )
        })?;

        Ok(Self {
            name: descriptor.name,
            module_name: module_name.to_string(),
            description: descriptor.description,
            inputs: descriptor.inputs,
            handler,
            services: descriptor.services,
        })
    }

    /// ``!config module action `input` (optional)``
    pub fn usage(&self, prefix: &str) -> String {
        let mut usage = format!("{}config {} {}", prefix, self.module_name, self.name);
        for input in &self.inputs {
            if input.required {
                usage.push_str(&format!(" `{}`", input.name));
            } else {
                usage.push_str(&format!(" ({})", input.name));
            }
        }
        usage
    }
}
