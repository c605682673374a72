//! Command descriptors and validated commands.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::plugin::ServiceRef;
use crate::application::response::Response;
use crate::domain::Embed;
use crate::shared::error::BotError;

/// Name of the flag every command carries implicitly.
pub const HELP_FLAG: &str = "help";

// ===== Argument & Flag Schemas =====

/// Value type of an argument or flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgType {
    #[default]
    String,
    Boolean,
    Integer,
}

/// Parsed flag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
    Int(i64),
}

impl FlagValue {
    /// Truthiness: booleans by value, anything else by presence.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(_) | Self::Int(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

/// Positional argument schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: String,
    pub description: String,
    pub arg_type: ArgType,
    pub required: bool,
    pub default: Option<String>,
    pub show_in_help: bool,
}

impl ArgSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            arg_type: ArgType::String,
            required: true,
            default: None,
            show_in_help: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn arg_type(mut self, arg_type: ArgType) -> Self {
        self.arg_type = arg_type;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show_in_help = false;
        self
    }
}

/// Named flag schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    pub name: String,
    pub short_alias: Option<char>,
    pub description: String,
    pub flag_type: ArgType,
    pub default: Option<FlagValue>,
    /// When set, the missing-args check is skipped
    pub ignore_arg_reqs: bool,
}

impl FlagSpec {
    fn with_type(name: impl Into<String>, flag_type: ArgType) -> Self {
        Self {
            name: name.into(),
            short_alias: None,
            description: String::new(),
            flag_type,
            default: None,
            ignore_arg_reqs: false,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_type(name, ArgType::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::with_type(name, ArgType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::with_type(name, ArgType::Integer)
    }

    pub fn short(mut self, alias: char) -> Self {
        self.short_alias = Some(alias);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn default_value(mut self, value: FlagValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn ignore_arg_reqs(mut self) -> Self {
        self.ignore_arg_reqs = true;
        self
    }
}

// ===== Handler =====

/// Command behavior supplied by a plugin.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &CommandContext, response: &mut Response) -> Result<(), BotError>;
}

// ===== Descriptor =====

/// Plugin-facing command declaration, validated by [`Command::from_descriptor`].
#[derive(Clone, Default)]
pub struct CommandDescriptor {
    pub name: String,
    pub module_name: Option<String>,
    pub description: String,
    pub run: Option<Arc<dyn CommandHandler>>,
    pub permissions: Vec<String>,
    pub args: Vec<ArgSpec>,
    pub flags: Vec<FlagSpec>,
    pub services: Vec<ServiceRef>,
    pub enabled_by_default: bool,
    pub can_be_disabled: bool,
    pub show_in_help: bool,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled_by_default: true,
            can_be_disabled: true,
            show_in_help: true,
            ..Default::default()
        }
    }

    pub fn module(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn run(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.run = Some(Arc::new(handler));
        self
    }

    pub fn permission(mut self, level: impl Into<String>) -> Self {
        self.permissions.push(level.into());
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn service(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.services.push(ServiceRef::new(namespace, name));
        self
    }

    pub fn enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    pub fn can_be_disabled(mut self, can_be_disabled: bool) -> Self {
        self.can_be_disabled = can_be_disabled;
        self
    }

    pub fn show_in_help(mut self, show: bool) -> Self {
        self.show_in_help = show;
        self
    }
}

// ===== Command =====

/// A validated, registered command.
pub struct Command {
    pub name: String,
    pub module_name: String,
    pub description: String,
    pub handler: Arc<dyn CommandHandler>,
    pub permissions: Vec<String>,
    pub args: Vec<ArgSpec>,
    pub flags: Vec<FlagSpec>,
    pub services: Vec<ServiceRef>,
    pub enabled_by_default: bool,
    pub can_be_disabled: bool,
    pub show_in_help: bool,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("module_name", &self.module_name)
            .field("permissions", &self.permissions)
            .field("args", &self.args)
            .field("flags", &self.flags)
            .field("enabled_by_default", &self.enabled_by_default)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Validate a descriptor. `owner` overrides the descriptor's module name.
    pub fn from_descriptor(descriptor: CommandDescriptor, owner: Option<&str>) -> Result<Self, BotError> {
        let CommandDescriptor {
            name,
            module_name,
            description,
            run,
            permissions,
            args,
            mut flags,
            services,
            enabled_by_default,
            can_be_disabled,
            show_in_help,
        } = descriptor;

        if name.trim().is_empty() {
            return Err(BotError::invalid_descriptor("name", "Name for command is missing."));
        }

        let module_name = owner
            .map(str::to_string)
            .or(module_name)
            .filter(|module| !module.trim().is_empty())
            .ok_or_else(|| {
                BotError::invalid_descriptor("moduleName", format!("moduleName for command {} is missing.", name))
            })?;

        let handler = run.ok_or_else(|| {
            BotError::invalid_descriptor("run", format!("run function for command {} is missing.", name))
        })?;

        if !flags.iter().any(|flag| flag.name.eq_ignore_ascii_case(HELP_FLAG)) {
            flags.push(
                FlagSpec::boolean(HELP_FLAG)
                    .short('h')
                    .description("Display help for this command"),
            );
        }

        Ok(Self {
            name,
            module_name,
            description,
            handler,
            permissions,
            args,
            flags,
            services,
            enabled_by_default,
            can_be_disabled,
            show_in_help,
        })
    }

    /// Arguments that must be supplied.
    pub fn required_args(&self) -> impl Iterator<Item = &ArgSpec> {
        self.args.iter().filter(|arg| arg.required)
    }

    /// Find a flag by long name.
    pub fn flag(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|flag| flag.name.eq_ignore_ascii_case(name))
    }

    /// Find a flag by single-character alias.
    pub fn flag_by_alias(&self, alias: char) -> Option<&FlagSpec> {
        self.flags.iter().find(|flag| flag.short_alias == Some(alias))
    }

    /// `!name <required> [optional]`
    pub fn usage(&self, prefix: &str) -> String {
        let mut usage = format!("{}{}", prefix, self.name);
        for arg in self.args.iter().filter(|arg| arg.show_in_help) {
            if arg.required {
                usage.push_str(&format!(" <{}>", arg.name));
            } else {
                usage.push_str(&format!(" [{}]", arg.name));
            }
        }
        usage
    }

    /// Usage embed shown for `--help` and missing arguments.
    pub fn help_embed(&self, prefix: &str) -> Embed {
        let mut embed = Embed::new().title(&self.name).field("Usage", self.usage(prefix));

        if !self.description.is_empty() {
            embed = embed.description(&self.description);
        }

        let args: Vec<String> = self
            .args
            .iter()
            .filter(|arg| arg.show_in_help)
            .map(|arg| {
                let mut line = format!("`{}`", arg.name);
                if arg.required {
                    line.push_str(" (required)");
                }
                if !arg.description.is_empty() {
                    line.push_str(&format!(" - {}", arg.description));
                }
                line
            })
            .collect();
        if !args.is_empty() {
            embed = embed.field("Arguments", args.join("\n"));
        }

        let flags: Vec<String> = self
            .flags
            .iter()
            .map(|flag| {
                let mut line = format!("`--{}`", flag.name);
                if let Some(alias) = flag.short_alias {
                    line.push_str(&format!(", `-{}`", alias));
                }
                if !flag.description.is_empty() {
                    line.push_str(&format!(" - {}", flag.description));
                }
                line
            })
            .collect();
        embed.field("Flags", flags.join("\n"))
    }
}
