//! The `command` module: per-guild command enablement through `config`.

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::plugin::{ConfigActionDescriptor, ConfigActionHandler, InputSpec, ModuleDescriptor};
use crate::application::response::ActionResult;
use crate::application::services::{CommandService, ModuleService, ServiceClass, CORE_NAMESPACE};
use crate::domain::Embed;
use crate::shared::error::BotError;

use super::required_input;

pub fn module() -> ModuleDescriptor {
    ModuleDescriptor::new("command")
        .description("Enable and disable commands")
        .can_be_disabled(false)
        .config_action(
            action("enable", "enable a command. Does not override disabled modules.", SetCommand { enable: true })
                .input(InputSpec::required("command", "The name of the command to enable")),
        )
        .config_action(
            action("disable", "disable a command", SetCommand { enable: false })
                .input(InputSpec::required("command", "The name of the command to disable")),
        )
        .config_action(
            action("enabled?", "check if a command is enabled", IsCommandEnabled)
                .input(InputSpec::required("command", "The name of the command to check")),
        )
        .config_action(
            action("list", "list all commands from all modules", ListCommands)
                .service(CORE_NAMESPACE, ModuleService::NAME),
        )
}

fn action(name: &str, description: &str, handler: impl ConfigActionHandler + 'static) -> ConfigActionDescriptor {
    ConfigActionDescriptor::new(name)
        .description(description)
        .service(CORE_NAMESPACE, CommandService::NAME)
        .run(handler)
}

struct SetCommand {
    enable: bool,
}

#[async_trait]
impl ConfigActionHandler for SetCommand {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let name = match required_input(ctx, "command", "A command name is required") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };

        let commands = ctx.bot.command_service();
        let toggled = if self.enable {
            commands.enable_command(ctx.guild.id, name).await
        } else {
            commands.disable_command(ctx.guild.id, name).await
        };

        match toggled {
            Ok(_) => {
                let state = if self.enable { "enabled" } else { "disabled" };
                Ok(ActionResult::ok(format!("{} has been {}", name, state)))
            }
            Err(err) => ActionResult::from_domain_error(err),
        }
    }
}

struct IsCommandEnabled;

#[async_trait]
impl ConfigActionHandler for IsCommandEnabled {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let name = match required_input(ctx, "command", "A command name is required") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };

        match ctx.bot.command_service().is_command_enabled(ctx.guild.id, name).await {
            Ok(enabled) => {
                let state = if enabled { "is enabled" } else { "is disabled" };
                Ok(ActionResult::ok(format!("command {} {}.", name, state)))
            }
            Err(err) => ActionResult::from_domain_error(err),
        }
    }
}

struct ListCommands;

/// Lines grouped by module, in first-seen order.
#[derive(Default)]
struct Grouped(Vec<(String, Vec<String>)>);

impl Grouped {
    fn push(&mut self, module: &str, line: String) {
        match self.0.iter_mut().find(|(name, _)| name == module) {
            Some((_, lines)) => lines.push(line),
            None => self.0.push((module.to_string(), vec![line])),
        }
    }

    fn render(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let blocks: Vec<String> = self
            .0
            .iter()
            .map(|(module, lines)| format!("**{}**\n\t{}", module, lines.join("\n\t")))
            .collect();
        Some(blocks.join("\n"))
    }
}

#[async_trait]
impl ConfigActionHandler for ListCommands {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let commands = ctx.bot.command_service();
        let modules = ctx.bot.module_service();

        let mut enabled = Grouped::default();
        let mut disabled = Grouped::default();

        for command in commands.commands() {
            let command_enabled = commands.is_command_enabled(ctx.guild.id, &command.name).await?;
            if command_enabled {
                enabled.push(&command.module_name, format!("*{}*\n\t\t{}", command.name, command.description));
                continue;
            }

            let module_enabled = modules.is_module_enabled(ctx.guild.id, &command.module_name).await?;
            let reason = if module_enabled {
                "explicitly disabled".to_string()
            } else {
                format!("module '{}' disabled", command.module_name)
            };
            disabled.push(
                &command.module_name,
                format!("*{}* - {}\n\t\t{}", command.name, reason, command.description),
            );
        }

        let mut embed = Embed::new();
        if let Some(list) = enabled.render() {
            embed = embed.field("Enabled Commands:", list);
        }
        if let Some(list) = disabled.render() {
            embed = embed.field("Disabled Commands:", list);
        }
        Ok(ActionResult::ok_embed("Here are all my available commands:", embed))
    }
}
