//! User-facing response strings.
//!
//! Every string is a template; `{name}` placeholders are filled by
//! [`ResponseStrings::render`]. Any of them can be overridden from the
//! `[response_strings]` config table.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponseStrings {
    /// Sent to the invoking user when a command fails. Placeholder: `{owner}`
    pub unhandled_exception_for_user: String,

    /// Sent to the bot owner along with the diagnostic embed
    pub unhandled_exception_for_owner: String,

    /// Shown above a command's help embed
    pub command_help: String,

    /// Shown above a command's help embed when required args are missing
    pub missing_argument: String,

    /// Config `--list` without a module
    pub config_module_list: String,

    /// Config `--list` for one module. Placeholder: `{module}`
    pub config_action_list: String,

    /// Unknown config action. Placeholders: `{action}`, `{module}`, `{prefix}`
    pub config_action_not_found: String,

    /// Owner DM after startup
    pub online: String,
}

impl Default for ResponseStrings {
    fn default() -> Self {
        Self {
            unhandled_exception_for_user: "I'm sorry, but there was an unexpected problem while running that command. {owner} has been notified.".into(),
            unhandled_exception_for_owner: "I encountered an unhandled exception while running a command:".into(),
            command_help: "Here's how to use that command:".into(),
            missing_argument: "I'm sorry, but I'm missing some information for that command:".into(),
            config_module_list: "Here are all my available modules:".into(),
            config_action_list: "Here are all the available actions for {module}:".into(),
            config_action_not_found: "I'm sorry, but {action} is not an available action for {module}. Try `{prefix}config {module} --list`.".into(),
            online: "I'm now online.".into(),
        }
    }
}

impl ResponseStrings {
    /// Fill `{key}` placeholders.
    pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
        vars.iter().fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), value)
        })
    }
}
