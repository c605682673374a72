//! The `permissions` module: the `admin` and `mod` levels and the config
//! actions that grant them to roles and users.

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::plugin::{ConfigActionDescriptor, ConfigActionHandler, InputSpec, ModuleDescriptor};
use crate::application::response::ActionResult;
use crate::application::services::{PermissionsService, ServiceClass, UserService, CORE_NAMESPACE};
use crate::domain::{Embed, UserId};
use crate::shared::error::BotError;

use super::required_input;

pub const ADMIN_LEVEL: &str = "admin";
pub const MOD_LEVEL: &str = "mod";

pub fn module() -> ModuleDescriptor {
    ModuleDescriptor::new("permissions")
        .description("Grant permission levels to roles and users")
        .can_be_disabled(false)
        .permission_level(ADMIN_LEVEL)
        .permission_level(MOD_LEVEL)
        .config_action(
            action("addRole", "Add a role to a permission level", Grant::AddRole)
                .input(InputSpec::required("role", "the name or mention of the role to add"))
                .input(InputSpec::required("level", "the permission level to add")),
        )
        .config_action(
            action("rmRole", "Remove a role from a permission level", Grant::RemoveRole)
                .input(InputSpec::required("role", "the name or mention of the role to remove"))
                .input(InputSpec::required("level", "the permission level to remove")),
        )
        .config_action(
            action("addUser", "Add a user to a permission level", Grant::AddUser)
                .input(InputSpec::required("user", "the name or mention of the user to add"))
                .input(InputSpec::required("level", "the permission level to add")),
        )
        .config_action(
            action("rmUser", "Remove a user from a permission level", Grant::RemoveUser)
                .input(InputSpec::required("user", "the name or mention of the user to remove"))
                .input(InputSpec::required("level", "the permission level to remove")),
        )
        .config_action(action("list", "list available permission levels", ListLevels))
}

fn action(name: &str, description: &str, handler: impl ConfigActionHandler + 'static) -> ConfigActionDescriptor {
    ConfigActionDescriptor::new(name)
        .description(description)
        .service(CORE_NAMESPACE, PermissionsService::NAME)
        .service(CORE_NAMESPACE, UserService::NAME)
        .run(handler)
}

#[derive(Debug, Clone, Copy)]
enum Grant {
    AddRole,
    RemoveRole,
    AddUser,
    RemoveUser,
}

impl Grant {
    fn target_input(self) -> &'static str {
        match self {
            Self::AddRole | Self::RemoveRole => "role",
            Self::AddUser | Self::RemoveUser => "user",
        }
    }

    fn adds(self) -> bool {
        matches!(self, Self::AddRole | Self::AddUser)
    }

    fn verb(self) -> &'static str {
        if self.adds() {
            "add"
        } else {
            "remove"
        }
    }

    async fn apply(self, ctx: &CommandContext, target: &str, level: &str) -> Result<ActionResult, BotError> {
        let permissions = ctx.bot.permissions_service();
        let users = ctx.bot.user_service();
        let guild = &ctx.guild;

        let name = match self {
            Self::AddRole | Self::RemoveRole => {
                let role = users.find_role(guild, target).await?;
                if self.adds() {
                    permissions.add_role(guild.id, level, &role).await?;
                } else {
                    permissions.remove_role(guild.id, level, &role).await?;
                }
                role.name
            }
            Self::AddUser | Self::RemoveUser => {
                let member = users.find_member(guild, target).await?;
                if self.adds() {
                    permissions.add_user(guild.id, level, &member.user).await?;
                } else {
                    permissions.remove_user(guild.id, level, &member.user).await?;
                }
                member.user.tag()
            }
        };

        let level = permissions.level(level).unwrap_or_else(|| level.to_string());
        let content = if self.adds() {
            format!("Added {} to {}", name, level)
        } else {
            format!("Removed {} from {}", name, level)
        };
        Ok(ActionResult::ok(content))
    }
}

#[async_trait]
impl ConfigActionHandler for Grant {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let input = self.target_input();
        let target = match required_input(ctx, input, &format!("the {} to {} is required", input, self.verb())) {
            Ok(target) => target,
            Err(result) => return Ok(result),
        };
        let level = match required_input(ctx, "level", &format!("the permission level to {} is required", self.verb())) {
            Ok(level) => level,
            Err(result) => return Ok(result),
        };

        match self.apply(ctx, target, level).await {
            Ok(result) => Ok(result),
            Err(err) => ActionResult::from_domain_error(err),
        }
    }
}

struct ListLevels;

#[async_trait]
impl ConfigActionHandler for ListLevels {
    async fn run(&self, ctx: &CommandContext) -> Result<ActionResult, BotError> {
        let bot = &ctx.bot;
        let guild = &ctx.guild;
        let platform = bot.platform();

        let members = platform.members(guild.id).await?;
        let roles = platform.roles(guild.id).await?;

        let user_tag = |id: UserId| {
            members
                .iter()
                .find(|member| member.user.id == id)
                .map(|member| member.user.tag())
                .unwrap_or_else(|| id.to_string())
        };

        let bot_owner = bot.owner().map(|owner| owner.tag()).unwrap_or_else(|| "unknown".into());
        let mut embed = Embed::new()
            .field("Bot Owner* - *bypasses permissions*", bot_owner)
            .field("Guild Owner* - *bypasses permissions*", user_tag(guild.owner_id))
            .footer("* Unassignable");

        let permissions = bot.permissions_service();
        for level in permissions.levels() {
            let data = permissions.permission_data(guild.id, &level).await?;

            let user_list: Vec<String> = data.users.iter().map(|id| user_tag(*id)).collect();
            let role_list: Vec<String> = data
                .roles
                .iter()
                .map(|id| {
                    roles
                        .iter()
                        .find(|role| role.id == *id)
                        .map(|role| role.name.clone())
                        .unwrap_or_else(|| id.to_string())
                })
                .collect();

            embed = embed.field(
                level,
                format!("**Users**: {}\n**Roles**: {}", user_list.join(", "), role_list.join(", ")),
            );
        }

        Ok(ActionResult::ok_embed("Here are the available permission levels:", embed))
    }
}
