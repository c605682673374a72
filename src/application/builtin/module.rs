//! The `module` module: per-guild module enablement through `config`.

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::plugin::{ConfigActionDescriptor, ConfigActionHandler, InputSpec, ModuleDescriptor};
use crate::application::response::ActionResult;
use crate::application::services::{ModuleService, ServiceClass, CORE_NAMESPACE};
use crate::domain::Embed;
use crate::shared::error::BotError;

use super::required_input;

pub fn module() -> ModuleDescriptor {
    ModuleDescriptor::new("module")
        .description("Enable and disable modules")
        .can_be_disabled(false)
        .config_action(
            action("enable", "enable a module", SetModule { enable: true })
                .input(InputSpec::required("module", "the name of the module to enable")),
        )
        .config_action(
            action("disable", "disable a module", SetModule { enable: false })
                .input(InputSpec::required("module", "the name of the module to disable")),
        )
        .config_action(
            action("enabled?", "check if a module is enabled", IsModuleEnabled)
                .input(InputSpec::required("module", "the name of the module to check")),
        )
        .config_action(action("list", "list all modules", ListModules))
}

fn action(name: &str, description: &str, handler: impl ConfigActionHandler + 'static) -> ConfigActionDescriptor {
    ConfigActionDescriptor::new(name)
        .description(description)
        .service(CORE_NAMESPACE, ModuleService::NAME)
        .run(handler)
}

struct SetModule {
    enable: bool,
}

#[async_trait]
impl ConfigActionHandler for SetModule {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let name = match required_input(ctx, "module", "A module name is required") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };

        let modules = ctx.bot.module_service();
        let outcome = match ctx.bot.module(name) {
            Ok(module) => {
                let toggled = if self.enable {
                    modules.enable_module(ctx.guild.id, &module.name).await
                } else {
                    modules.disable_module(ctx.guild.id, &module.name).await
                };
                toggled.map(|_| module)
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(module) => {
                let state = if self.enable { "enabled" } else { "disabled" };
                Ok(ActionResult::ok(format!("The module {} is now {}.", module.name, state)))
            }
            Err(err) => ActionResult::from_domain_error(err),
        }
    }
}

struct IsModuleEnabled;

#[async_trait]
impl ConfigActionHandler for IsModuleEnabled {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let name = match required_input(ctx, "module", "A module name is required") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };

        match ctx.bot.module_service().is_module_enabled(ctx.guild.id, name).await {
            Ok(enabled) => {
                let state = if enabled { "is enabled" } else { "is disabled" };
                Ok(ActionResult::ok(format!("module {} {}.", name, state)))
            }
            Err(err) => ActionResult::from_domain_error(err),
        }
    }
}

struct ListModules;

#[async_trait]
impl ConfigActionHandler for ListModules {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let service = ctx.bot.module_service();
        let mut enabled = Vec::new();
        let mut disabled = Vec::new();

        for module in service.modules()? {
            let line = if module.description.is_empty() {
                format!("*{}*", module.name)
            } else {
                format!("*{}*\n\t\t{}", module.name, module.description)
            };

            if service.is_module_enabled(ctx.guild.id, &module.name).await? {
                enabled.push(line);
            } else {
                disabled.push(line);
            }
        }

        let mut embed = Embed::new();
        if !enabled.is_empty() {
            embed = embed.field("Enabled Modules:", enabled.join("\n"));
        }
        if !disabled.is_empty() {
            embed = embed.field("Disabled Modules:", disabled.join("\n"));
        }
        Ok(ActionResult::ok_embed("Here are all my available modules:", embed))
    }
}
