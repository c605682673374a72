//! Startup, event loop and shutdown tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use botframe::application::plugin::{CommandDescriptor, CommandHandler, ModuleDescriptor, ModuleHooks};
use botframe::application::services::command_service::ENABLED_COMMANDS_KEY;
use botframe::application::services::{DispatchOutcome, Service, ServiceClass};
use botframe::application::{CommandContext, Response};
use botframe::config::Settings;
use botframe::domain::{Guild, GuildId, Member, PlatformEvent, SendTarget, Snowflake};
use botframe::infrastructure::data::JsonFileGuildData;
use botframe::startup::{Bot, BotBuilder, BotHandle};
use botframe::BotError;

use crate::common::{
    bot_user, eventually, greeter_module, seeded_platform, test_settings, HookLog, TestBot, GUILD_ID,
    GUILD_OWNER_ID, OWNER_ID,
};

const WAIT: Duration = Duration::from_secs(2);

struct Pong;

#[async_trait]
impl CommandHandler for Pong {
    async fn run(&self, _ctx: &CommandContext, response: &mut Response) -> Result<(), BotError> {
        response.send_message("pong").await
    }
}

struct NeedsApiKey;

impl ServiceClass for NeedsApiKey {
    const NAME: &'static str = "NeedsApiKey";

    fn construct(_bot: BotHandle) -> Self {
        Self
    }
}

#[async_trait]
impl Service for NeedsApiKey {
    async fn configure_service(&self, _settings: &Settings) -> Result<(), BotError> {
        Err(BotError::InvalidConfig("api key missing".into()))
    }
}

struct FlakyHooks;

#[async_trait]
impl ModuleHooks for FlakyHooks {
    async fn on_listen(&self, _bot: &Arc<Bot>) -> Result<(), BotError> {
        Err(anyhow::anyhow!("listener exploded").into())
    }
}

/// Queries the runtime from inside the startup barrier.
struct StatusHooks {
    log: HookLog,
}

#[async_trait]
impl ModuleHooks for StatusHooks {
    async fn on_listen(&self, bot: &Arc<Bot>) -> Result<(), BotError> {
        let listening = bot.is_listening().await;
        let shutdown = bot.shutdown().await;
        self.log
            .lock()
            .push(format!("listening:{} shutdown:{}", listening, shutdown.is_ok()));
        Ok(())
    }
}

#[tokio::test]
async fn test_hooks_can_query_bot_during_startup() {
    let (platform, _world) = seeded_platform();
    let log = HookLog::default();
    let bot = BotBuilder::new(test_settings())
        .platform(platform)
        .module(ModuleDescriptor::new("status").hooks(StatusHooks { log: log.clone() }))
        .build()
        .await
        .expect("bot builds");

    tokio::time::timeout(WAIT, bot.listen())
        .await
        .expect("startup finishes")
        .expect("bot listens");

    assert_eq!(log.lock().clone(), vec!["listening:false shutdown:false".to_string()]);
    assert!(bot.is_listening().await);
}

#[tokio::test]
async fn test_listen_runs_startup_barrier() {
    let (platform, _world) = seeded_platform();
    let hooks = HookLog::default();
    let bot = BotBuilder::new(test_settings())
        .platform(platform.clone())
        .module(greeter_module(hooks.clone()))
        .build()
        .await
        .expect("bot builds");

    assert!(!bot.is_listening().await);
    bot.listen().await.expect("bot listens");
    assert!(bot.is_listening().await);

    assert_eq!(bot.bot_user().map(|me| me.id), Some(bot_user().id));
    assert_eq!(bot.owner().map(|owner| owner.id), Some(Snowflake::new(OWNER_ID)));

    let dms = platform.sent_to(SendTarget::User(OWNER_ID.into()));
    assert_eq!(dms.len(), 1);
    assert_eq!(dms[0].content, "I'm now online.");

    let calls = hooks.lock().clone();
    assert!(calls.contains(&"listen".to_string()));
    assert!(calls.contains(&format!("join:{}", GUILD_ID)));
    assert!(calls.contains(&format!("enabled:{}", GUILD_ID)));

    let seeded = bot
        .data_store()
        .get_guild_data(GUILD_ID.into(), ENABLED_COMMANDS_KEY)
        .await
        .expect("data readable");
    assert_eq!(seeded, Some(json!({})));
}

#[tokio::test]
async fn test_listen_twice_is_a_no_op() {
    let test = TestBot::new().await;

    test.bot.listen().await.expect("second listen is fine");

    assert!(test.owner_dms().is_empty());
}

#[tokio::test]
async fn test_online_message_can_be_turned_off() {
    let (platform, _world) = seeded_platform();
    let settings = Settings {
        message_owner_on_boot: false,
        ..test_settings()
    };
    let bot = BotBuilder::new(settings)
        .platform(platform.clone())
        .build()
        .await
        .expect("bot builds");

    bot.listen().await.expect("bot listens");

    assert!(platform.sent().is_empty());
}

#[tokio::test]
async fn test_stop_before_listen() {
    let (platform, _world) = seeded_platform();
    let bot = BotBuilder::new(test_settings())
        .platform(platform)
        .build()
        .await
        .expect("bot builds");

    assert!(matches!(bot.shutdown().await, Err(BotError::NotListening)));
    assert!(matches!(bot.run_until_stopped().await, Err(BotError::NotListening)));
}

#[tokio::test]
async fn test_build_verifies_settings() {
    let (platform, _world) = seeded_platform();
    let settings = Settings {
        login_token: None,
        ..test_settings()
    };

    let result = BotBuilder::new(settings).platform(platform).build().await;

    assert!(matches!(result, Err(BotError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_build_requires_platform() {
    let result = BotBuilder::new(test_settings()).build().await;

    assert!(matches!(result, Err(BotError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_duplicate_module_is_rejected() {
    let (platform, _world) = seeded_platform();

    let result = BotBuilder::new(test_settings())
        .platform(platform)
        .module(greeter_module(HookLog::default()))
        .module(ModuleDescriptor::new("Greeter"))
        .build()
        .await;

    assert!(matches!(result, Err(BotError::ModuleAlreadyExists(_))));
}

#[tokio::test]
async fn test_unknown_owner_fails_listen() {
    let (platform, _world) = seeded_platform();
    let settings = Settings {
        owner_user_id: Some(Snowflake::new(4242)),
        ..test_settings()
    };
    let bot = BotBuilder::new(settings)
        .platform(platform)
        .build()
        .await
        .expect("bot builds");

    assert!(matches!(bot.listen().await, Err(BotError::OwnerNotFound)));
}

#[tokio::test]
async fn test_service_configure_failure_aborts_listen() {
    let (platform, _world) = seeded_platform();
    let bot = BotBuilder::new(test_settings())
        .platform(platform)
        .module(ModuleDescriptor::new("billing").service::<NeedsApiKey>())
        .build()
        .await
        .expect("bot builds");

    assert!(matches!(bot.listen().await, Err(BotError::InvalidConfig(_))));
    assert!(!bot.is_listening().await);
}

#[tokio::test]
async fn test_hook_failure_is_reported_not_fatal() {
    let (platform, _world) = seeded_platform();
    let bot = BotBuilder::new(test_settings())
        .platform(platform.clone())
        .module(ModuleDescriptor::new("flaky").hooks(FlakyHooks))
        .build()
        .await
        .expect("bot builds");

    bot.listen().await.expect("hook errors are not fatal");

    let dms = platform.sent_to(SendTarget::User(OWNER_ID.into()));
    let report = dms
        .iter()
        .find_map(|dm| dm.embed.as_ref())
        .expect("diagnostic embed");
    assert_eq!(report.field_value("Error:"), Some("Error: listener exploded"));
    assert_eq!(report.field_value("Hook"), Some("on_listen"));
    assert_eq!(report.field_value("Listener Type"), Some("Module"));
    assert_eq!(report.field_value("Listener Name"), Some("flaky"));
}

#[tokio::test]
async fn test_add_command_to_module() {
    let (platform, world) = seeded_platform();
    let bot = BotBuilder::new(test_settings())
        .platform(platform.clone())
        .module(greeter_module(HookLog::default()))
        .build()
        .await
        .expect("bot builds");

    let orphan = CommandDescriptor::new("orphan").module("ghost").run(Pong);
    assert!(matches!(bot.add_command(orphan), Err(BotError::ModuleNotFound(_))));

    bot.add_command(CommandDescriptor::new("ping").module("greeter").run(Pong))
        .expect("command added");
    assert!(matches!(
        bot.add_command(CommandDescriptor::new("PING").module("greeter").run(Pong)),
        Err(BotError::CommandAlreadyExists(_))
    ));

    bot.listen().await.expect("bot listens");
    let message = botframe::domain::Message::in_guild(1, "!ping", world.member, world.channel, world.guild);
    assert_eq!(
        bot.command_service().run_command_for_msg(&message).await,
        DispatchOutcome::Completed
    );
}

#[tokio::test]
async fn test_registration_closes_on_listen() {
    let test = TestBot::new().await;

    let result = test.bot.add_module(ModuleDescriptor::new("late"));

    assert!(matches!(result, Err(BotError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_event_loop_dispatches_messages() {
    let test = TestBot::new().await;

    let own = Member::new(GUILD_ID, bot_user());
    test.platform
        .push_message(test.message(&own, "!greet Me"))
        .expect("event queued");
    test.platform
        .push_message(test.message(&test.world.member, "!greet Ada"))
        .expect("event queued");

    assert!(test.platform.wait_for_sent(1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let replies = test.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].content, "Hello, Ada!");
}

#[tokio::test]
async fn test_guild_join_event_runs_join_hooks() {
    let test = TestBot::new().await;
    let guild = Guild::new(300, "Second Guild", GUILD_OWNER_ID);

    test.platform.join_guild(guild).expect("event queued");

    assert!(eventually(|| test.hook_calls().contains(&"join:300".to_string())).await);
    let seeded = test
        .bot
        .data_store()
        .get_guild_data(GuildId::new(300), ENABLED_COMMANDS_KEY)
        .await
        .expect("data readable");
    assert_eq!(seeded, Some(json!({})));
}

#[tokio::test]
async fn test_shutdown_stops_event_loop() {
    let test = TestBot::new().await;

    test.bot.shutdown().await.expect("shutdown signalled");
    tokio::time::timeout(WAIT, test.bot.run_until_stopped())
        .await
        .expect("event loop stops")
        .expect("event loop exits cleanly");

    let late = PlatformEvent::MessageReceived(test.message(&test.world.member, "!greet Ada"));
    assert!(test.platform.push_event(late).is_err());
}

#[tokio::test]
async fn test_guild_data_survives_restart() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("guild-data.json");

    {
        let store = JsonFileGuildData::open(&path).await.expect("store opens");
        let (platform, world) = seeded_platform();
        let bot = BotBuilder::new(test_settings())
            .platform(platform)
            .data_store(Arc::new(store))
            .build()
            .await
            .expect("bot builds");
        bot.listen().await.expect("bot listens");

        let message = botframe::domain::Message::in_guild(
            1,
            "!config core setPrefix ?",
            world.guild_owner,
            world.channel,
            world.guild,
        );
        assert_eq!(
            bot.command_service().run_command_for_msg(&message).await,
            DispatchOutcome::Completed
        );
        bot.shutdown().await.expect("shutdown signalled");
    }

    let store = JsonFileGuildData::open(&path).await.expect("store reopens");
    let (platform, _world) = seeded_platform();
    let bot = BotBuilder::new(test_settings())
        .platform(platform)
        .data_store(Arc::new(store))
        .build()
        .await
        .expect("bot builds");
    bot.listen().await.expect("bot listens");

    assert_eq!(bot.command_service().prefix(GUILD_ID.into()), "?");
}
