//! Module and command enablement tests

use futures::future::join_all;
use pretty_assertions::assert_eq;
use serde_json::json;

use botframe::application::plugin::{CommandDescriptor, ModuleDescriptor};
use botframe::application::services::module_service::ENABLED_MODULES_KEY;
use botframe::application::services::{DispatchOutcome, HaltReason};
use botframe::domain::GuildId;

use crate::common::{greeter_module, HookLog, Reply, TestBot, GUILD_ID};

#[tokio::test]
async fn test_disable_module_disables_its_commands() {
    let test = TestBot::new().await;

    assert_eq!(
        test.config("module disable greeter").await,
        "The module greeter is now disabled."
    );

    let outcome = test.send(&test.world.member, "!greet Ada").await;
    assert_eq!(outcome, DispatchOutcome::Halted(HaltReason::CommandDisabled));
    assert!(test.hook_calls().contains(&format!("disabled:{}", GUILD_ID)));

    let stored = test
        .bot
        .data_service()
        .get_guild_data(test.guild_id(), ENABLED_MODULES_KEY)
        .await
        .expect("data readable");
    assert_eq!(stored, Some(json!({ "greeter": false })));

    assert_eq!(
        test.config("module enable greeter").await,
        "The module greeter is now enabled."
    );
    assert_eq!(test.send(&test.world.member, "!greet Ada").await, DispatchOutcome::Completed);
}

#[tokio::test]
async fn test_module_state_errors_are_shown() {
    let test = TestBot::new().await;

    assert_eq!(
        test.config("module enable greeter").await,
        "Module greeter is already enabled."
    );
    assert_eq!(
        test.config("module disable core").await,
        "The module 'core' can not be disabled"
    );
    assert_eq!(
        test.config("module enable nothing").await,
        "Module 'nothing' could not be found. Has it been added to the bot?"
    );
    assert_eq!(test.config("module enable").await, "A module name is required");
}

#[tokio::test]
async fn test_module_enabled_query() {
    let test = TestBot::new().await;

    assert_eq!(test.config("module enabled? greeter").await, "module greeter is enabled.");
    test.config("module disable greeter").await;
    assert_eq!(test.config("module enabled? greeter").await, "module greeter is disabled.");
}

#[tokio::test]
async fn test_module_list() {
    let test = TestBot::new().await;
    test.config("module disable greeter").await;

    test.config("module list").await;

    let reply = test.last_reply();
    assert_eq!(reply.content, "Here are all my available modules:");
    let embed = reply.embed.expect("module list embed");
    assert_eq!(
        embed.field_value("Disabled Modules:"),
        Some("*greeter*\n\t\tSays hello")
    );
    assert!(embed
        .field_value("Enabled Modules:")
        .is_some_and(|enabled| enabled.contains("*core*")));
}

#[tokio::test]
async fn test_disable_and_enable_command() {
    let test = TestBot::new().await;

    assert_eq!(test.config("command disable greet").await, "greet has been disabled");
    assert_eq!(
        test.send(&test.world.member, "!greet Ada").await,
        DispatchOutcome::Halted(HaltReason::CommandDisabled)
    );
    assert_eq!(test.config("command enabled? greet").await, "command greet is disabled.");

    assert_eq!(test.config("command enable greet").await, "greet has been enabled");
    assert_eq!(test.send(&test.world.member, "!greet Ada").await, DispatchOutcome::Completed);
}

#[tokio::test]
async fn test_enable_default_disabled_command() {
    let test = TestBot::new().await;

    assert_eq!(test.config("command enable quiet").await, "quiet has been enabled");
    assert_eq!(test.send(&test.world.member, "!quiet").await, DispatchOutcome::Completed);
    assert_eq!(test.last_reply().content, "shh");
}

#[tokio::test]
async fn test_command_enable_does_not_override_module() {
    let test = TestBot::new().await;
    test.config("module disable greeter").await;

    assert_eq!(
        test.config("command enable greet").await,
        "Command greet is already enabled."
    );
    assert_eq!(test.config("command enabled? greet").await, "command greet is disabled.");
}

#[tokio::test]
async fn test_command_state_errors_are_shown() {
    let test = TestBot::new().await;

    assert_eq!(
        test.config("command disable help").await,
        "Command help is required and can not be disabled."
    );
    assert_eq!(
        test.config("command disable config").await,
        "Command config is required and can not be disabled."
    );
    assert_eq!(test.config("command disable nope").await, "Command nope does not exist");
    assert_eq!(test.config("command disable").await, "A command name is required");

    test.config("command disable greet").await;
    assert_eq!(
        test.config("command disable greet").await,
        "Command greet is already disabled."
    );
}

#[tokio::test]
async fn test_command_list_gives_disable_reasons() {
    let test = TestBot::new().await;
    test.config("module disable greeter").await;

    test.config("command list").await;

    let reply = test.last_reply();
    assert_eq!(reply.content, "Here are all my available commands:");
    let embed = reply.embed.expect("command list embed");
    let disabled = embed.field_value("Disabled Commands:").expect("disabled commands");
    assert!(disabled.contains("**greeter**"));
    assert!(disabled.contains("*greet* - module 'greeter' disabled\n\t\tGreet someone"));
    let enabled = embed.field_value("Enabled Commands:").expect("enabled commands");
    assert!(enabled.contains("*help*"));
}

#[tokio::test]
async fn test_explicitly_disabled_reason() {
    let test = TestBot::new().await;

    test.config("command list").await;
    let embed = test.last_reply().embed.expect("command list embed");
    assert!(embed
        .field_value("Disabled Commands:")
        .is_some_and(|disabled| disabled.contains("*quiet* - explicitly disabled")));
}

#[tokio::test]
async fn test_enablement_is_per_guild() {
    let test = TestBot::new().await;
    let modules = test.bot.module_service();
    let other_guild = GuildId::new(999);

    modules
        .disable_module(test.guild_id(), "greeter")
        .await
        .expect("module disables");

    assert!(!modules.is_module_enabled(test.guild_id(), "greeter").await.unwrap());
    assert!(modules.is_module_enabled(other_guild, "greeter").await.unwrap());
}

#[tokio::test]
async fn test_undisableable_command_follows_its_module() {
    let hooks = HookLog::default();
    let gated = ModuleDescriptor::new("gated").command(
        CommandDescriptor::new("sticky")
            .can_be_disabled(false)
            .run(Reply("still here")),
    );
    let test = TestBot::start(vec![greeter_module(hooks.clone()), gated], hooks).await;
    let commands = test.bot.command_service();

    assert_eq!(test.send(&test.world.member, "!sticky").await, DispatchOutcome::Completed);
    assert_eq!(
        test.config("command disable sticky").await,
        "Command sticky can not be disabled."
    );

    test.config("module disable gated").await;
    assert!(!commands.is_command_enabled(test.guild_id(), "sticky").await.unwrap());
    assert_eq!(
        test.send(&test.world.member, "!sticky").await,
        DispatchOutcome::Halted(HaltReason::CommandDisabled)
    );

    test.config("module enable gated").await;
    assert!(commands.is_command_enabled(test.guild_id(), "sticky").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_command_toggles_are_all_kept() {
    let test = TestBot::new().await;
    let guild_id = test.guild_id();
    let names = ["greet", "boom", "panic", "secret", "count"];

    let toggles = names.iter().copied().map(|name| {
        let bot = test.bot.clone();
        tokio::spawn(async move { bot.command_service().disable_command(guild_id, name).await })
    });
    for toggle in join_all(toggles).await {
        toggle.expect("toggle task finishes").expect("command disabled");
    }

    let commands = test.bot.command_service();
    for name in names {
        assert!(!commands.is_command_enabled(guild_id, name).await.unwrap(), "{} still enabled", name);
    }
}
