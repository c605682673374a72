//! The `core` module: `config`, `help` and the `setPrefix` action.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use crate::application::context::CommandContext;
use crate::application::plugin::{
    ArgSpec, CommandDescriptor, CommandHandler, ConfigActionDescriptor, ConfigActionHandler, FlagSpec, InputSpec,
    ModuleDescriptor,
};
use crate::application::response::{ActionResult, Response, ResponseData, ResponseType};
use crate::application::services::command_service::{CORE_MODULE, ENABLED_COMMANDS_KEY};
use crate::application::services::module_service::ENABLED_MODULES_KEY;
use crate::application::services::{CommandService, ConfigActionService, ModuleService, ServiceClass, CORE_NAMESPACE};
use crate::config::ResponseStrings;
use crate::domain::Embed;
use crate::shared::error::BotError;

/// Positional slots `config` maps onto action inputs.
const CONFIG_INPUT_SLOTS: usize = 5;

pub fn module() -> ModuleDescriptor {
    ModuleDescriptor::new(CORE_MODULE)
        .description("Core commands and configuration")
        .can_be_disabled(false)
        .default_data(ENABLED_MODULES_KEY, json!({}))
        .default_data(ENABLED_COMMANDS_KEY, json!({}))
        .command(config_command())
        .command(help_command())
        .config_action(
            ConfigActionDescriptor::new("setPrefix")
                .description("Change the command prefix for this guild")
                .input(InputSpec::required("prefix", "the new prefix"))
                .service(CORE_NAMESPACE, CommandService::NAME)
                .run(SetPrefix),
        )
}

fn config_command() -> CommandDescriptor {
    let mut command = CommandDescriptor::new("config")
        .description("Edit or view settings for this guild")
        .permission("admin")
        .service(CORE_NAMESPACE, CommandService::NAME)
        .service(CORE_NAMESPACE, ConfigActionService::NAME)
        .service(CORE_NAMESPACE, ModuleService::NAME)
        .flag(
            FlagSpec::boolean("list")
                .short('l')
                .description("List all available modules and actions")
                .ignore_arg_reqs(),
        )
        .arg(ArgSpec::required("module").description("the module to configure"))
        .arg(ArgSpec::required("action").description("the config action to perform"))
        .run(ConfigCommand);

    for slot in 1..=CONFIG_INPUT_SLOTS {
        command = command.arg(
            ArgSpec::optional(format!("input{}", slot))
                .description("input value")
                .hidden(),
        );
    }
    command
}

fn help_command() -> CommandDescriptor {
    CommandDescriptor::new("help")
        .description("List the available commands, or show how to use one")
        .arg(ArgSpec::optional("command").description("the command to explain"))
        .service(CORE_NAMESPACE, CommandService::NAME)
        .run(HelpCommand)
}

// ===== config =====

struct ConfigCommand;

#[async_trait]
impl CommandHandler for ConfigCommand {
    async fn run(&self, ctx: &CommandContext, response: &mut Response) -> Result<(), BotError> {
        let strings = ctx.bot.responses();

        if ctx.flag("list") {
            return match ctx.arg("module") {
                None => {
                    let content = ResponseStrings::render(&strings.config_module_list, &[]);
                    response.send_embed(content, module_list_embed(ctx)).await
                }
                Some(module_name) => match action_list_embed(ctx, module_name) {
                    Ok(embed) => {
                        let content = ResponseStrings::render(&strings.config_action_list, &[("module", module_name)]);
                        response.send_embed(content, embed).await
                    }
                    Err(BotError::ModuleNotFound(_)) => {
                        response
                            .send_with(ResponseData {
                                response_type: Some(ResponseType::Message),
                                content: Some(format!("Module {} could not be found.", module_name)),
                                embed: None,
                            })
                            .await
                    }
                    Err(err) => Err(err),
                },
            };
        }

        let (Some(module_name), Some(action_name)) = (ctx.arg("module"), ctx.arg("action")) else {
            return Ok(());
        };

        let Some(action) = ctx.bot.config_action_service().get_action(module_name, action_name) else {
            let prefix = ctx.prefix();
            let content = ResponseStrings::render(
                &strings.config_action_not_found,
                &[("action", action_name), ("module", module_name), ("prefix", prefix.as_str())],
            );
            return response.send_message(content).await;
        };

        let inputs: HashMap<String, String> = action
            .inputs
            .iter()
            .take(CONFIG_INPUT_SLOTS)
            .enumerate()
            .filter_map(|(index, input)| {
                ctx.arg(&format!("input{}", index + 1))
                    .map(|value| (input.name.clone(), value.to_string()))
            })
            .collect();

        tracing::debug!(module = %action.module_name, action = %action.name, "running config action");
        let result = action.handler.run(&ctx.with_inputs(inputs)).await?;
        tracing::debug!(status = result.status, "config action finished");

        match result.embed {
            Some(embed) => response.send_embed(result.content, embed).await,
            None => response.send_message(result.content).await,
        }
    }
}

fn module_list_embed(ctx: &CommandContext) -> Embed {
    let prefix = ctx.prefix();
    let actions = ctx.bot.config_action_service();

    ctx.bot
        .modules()
        .iter()
        .map(|module| (module.name.clone(), actions.actions_for(&module.name)))
        .filter(|(_, module_actions)| !module_actions.is_empty())
        .fold(
            Embed::new().description(format!("For more info: {}config `module` --list", prefix)),
            |embed, (name, module_actions)| {
                let names: Vec<&str> = module_actions.iter().map(|action| action.name.as_str()).collect();
                embed.field(name, names.join(", "))
            },
        )
}

fn action_list_embed(ctx: &CommandContext, module_name: &str) -> Result<Embed, BotError> {
    let module = ctx.bot.module(module_name)?;
    let prefix = ctx.prefix();

    let mut embed = Embed::new();
    for action in ctx.bot.config_action_service().actions_for(&module.name) {
        let mut value = Vec::new();
        if !action.description.is_empty() {
            value.push(format!("*Description*:\n\t{}", action.description));
        }
        value.push(format!("*Usage*:\n\t{}", action.usage(&prefix)));

        let inputs: Vec<String> = action
            .inputs
            .iter()
            .map(|input| {
                let mut line = format!("`{}`", input.name);
                if !input.required {
                    line.push_str(" (optional)");
                }
                if !input.description.is_empty() {
                    line.push_str(&format!(": {}", input.description));
                }
                line
            })
            .collect();
        if !inputs.is_empty() {
            value.push(format!("*Inputs*:\n\t{}", inputs.join("\n\t")));
        }

        embed = embed.field(&action.name, value.join("\n"));
    }
    Ok(embed)
}

// ===== help =====

struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn run(&self, ctx: &CommandContext, response: &mut Response) -> Result<(), BotError> {
        let commands = ctx.bot.command_service();
        let prefix = ctx.prefix();

        if let Some(name) = ctx.arg("command") {
            return match commands.command(name) {
                Ok(command) => {
                    let content = ctx.bot.responses().command_help.clone();
                    response.send_embed(content, command.help_embed(&prefix)).await
                }
                Err(err @ BotError::CommandNotFound(_)) => response.send_message(err.to_string()).await,
                Err(err) => Err(err),
            };
        }

        let mut by_module: Vec<(String, Vec<String>)> = Vec::new();
        for command in commands.commands().iter().filter(|command| command.show_in_help) {
            if !commands.is_command_enabled(ctx.guild.id, &command.name).await? {
                continue;
            }

            let line = if command.description.is_empty() {
                format!("`{}`", command.usage(&prefix))
            } else {
                format!("`{}` - {}", command.usage(&prefix), command.description)
            };
            match by_module.iter_mut().find(|(module, _)| *module == command.module_name) {
                Some((_, lines)) => lines.push(line),
                None => by_module.push((command.module_name.clone(), vec![line])),
            }
        }

        let embed = by_module.into_iter().fold(
            Embed::new().description(format!("For more info: {}help `command`", prefix)),
            |embed, (module, lines)| embed.field(module, lines.join("\n")),
        );
        response.send_embed("Here are all my available commands:", embed).await
    }
}

// ===== setPrefix =====

struct SetPrefix;

#[async_trait]
impl ConfigActionHandler for SetPrefix {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let prefix = match super::required_input(ctx, "prefix", "A prefix is required") {
            Ok(prefix) => prefix,
            Err(result) => return Ok(result),
        };

        match ctx.bot.command_service().set_prefix(ctx.guild.id, prefix).await {
            Ok(()) => Ok(ActionResult::ok(format!("My prefix is now `{}`", prefix.trim()))),
            Err(err) => ActionResult::from_domain_error(err),
        }
    }
}
