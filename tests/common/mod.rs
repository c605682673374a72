//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure: a `TestBot` wrapping
//! a listening bot on a `LocalPlatform`, and a `greeter` fixture module.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fake::faker::name::en::FirstName;
use fake::Fake;
use parking_lot::Mutex;

use botframe::application::plugin::{
    ArgSpec, ArgType, CommandDescriptor, CommandHandler, FlagSpec, ModuleDescriptor, ModuleHooks,
};
use botframe::application::services::{DispatchOutcome, Service, ServiceClass};
use botframe::application::{CommandContext, Response};
use botframe::config::Settings;
use botframe::domain::{
    Channel, Guild, GuildId, Member, Message, OutboundMessage, Role, SendTarget, User,
};
use botframe::infrastructure::platform::LocalPlatform;
use botframe::startup::{Bot, BotBuilder, BotHandle};
use botframe::BotError;

pub const BOT_ID: u64 = 1;
pub const OWNER_ID: u64 = 10;
pub const GUILD_OWNER_ID: u64 = 20;
pub const MEMBER_ID: u64 = 30;
pub const GUILD_ID: u64 = 100;
pub const CHANNEL_ID: u64 = 101;
pub const MOD_ROLE_ID: u64 = 200;

pub type HookLog = Arc<Mutex<Vec<String>>>;

/// Settings that pass verification.
pub fn test_settings() -> Settings {
    Settings {
        owner_user_id: Some(OWNER_ID.into()),
        login_token: Some("test-token".into()),
        ..Settings::default()
    }
}

/// The bot account.
pub fn bot_user() -> User {
    User {
        bot: true,
        ..User::new(BOT_ID, "botframe")
    }
}

/// Guild, roles, members and users every test starts from.
pub struct World {
    pub guild: Guild,
    pub channel: Channel,
    pub owner: Member,
    pub guild_owner: Member,
    pub member: Member,
    pub mod_role: Role,
}

impl World {
    pub fn new() -> Self {
        let guild = Guild::new(GUILD_ID, "Test Guild", GUILD_OWNER_ID);
        let member_name: String = FirstName().fake();

        Self {
            channel: Channel::text(CHANNEL_ID, GUILD_ID, "general"),
            owner: Member::new(GUILD_ID, User::new(OWNER_ID, "owner")),
            guild_owner: Member::new(GUILD_ID, User::new(GUILD_OWNER_ID, "guild-owner")),
            member: Member::new(GUILD_ID, User::new(MEMBER_ID, member_name)),
            mod_role: Role::new(MOD_ROLE_ID, GUILD_ID, "Moderators"),
            guild,
        }
    }

    pub fn seed(&self, platform: &LocalPlatform) {
        platform.add_guild(self.guild.clone());
        platform.add_member(self.owner.clone());
        platform.add_member(self.guild_owner.clone());
        platform.add_member(self.member.clone());
        platform.add_role(self.mod_role.clone());
    }
}

/// A platform seeded with the default world.
pub fn seeded_platform() -> (Arc<LocalPlatform>, World) {
    let platform = Arc::new(LocalPlatform::new(bot_user()));
    let world = World::new();
    world.seed(&platform);
    (platform, world)
}

/// A listening bot plus handles on everything around it.
pub struct TestBot {
    pub bot: Arc<Bot>,
    pub platform: Arc<LocalPlatform>,
    pub world: World,
    pub hooks: HookLog,
    next_message_id: AtomicU64,
}

impl TestBot {
    /// Bot with the greeter module, listening, startup messages cleared.
    pub async fn new() -> Self {
        let hooks = HookLog::default();
        Self::start(vec![greeter_module(hooks.clone())], hooks).await
    }

    pub async fn start(modules: Vec<ModuleDescriptor>, hooks: HookLog) -> Self {
        let (platform, world) = seeded_platform();

        let mut builder = BotBuilder::new(test_settings()).platform(platform.clone());
        for module in modules {
            builder = builder.module(module);
        }
        let bot = builder.build().await.expect("bot builds");
        bot.listen().await.expect("bot listens");
        platform.take_sent();

        Self {
            bot,
            platform,
            world,
            hooks,
            next_message_id: AtomicU64::new(1_000),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.world.guild.id
    }

    pub fn message(&self, author: &Member, content: &str) -> Message {
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        Message::in_guild(
            id,
            content,
            author.clone(),
            self.world.channel.clone(),
            self.world.guild.clone(),
        )
    }

    /// Run one message through the dispatch pipeline.
    pub async fn send(&self, author: &Member, content: &str) -> DispatchOutcome {
        let message = self.message(author, content);
        self.bot.command_service().run_command_for_msg(&message).await
    }

    /// Send as the guild owner, who bypasses permission checks.
    pub async fn send_as_admin(&self, content: &str) -> DispatchOutcome {
        let author = self.world.guild_owner.clone();
        self.send(&author, content).await
    }

    /// Run a config command as admin and return the reply text.
    pub async fn config(&self, args: &str) -> String {
        self.platform.take_sent();
        let outcome = self.send_as_admin(&format!("!config {}", args)).await;
        assert_eq!(outcome, DispatchOutcome::Completed, "config {} did not complete", args);
        self.last_reply().content
    }

    pub fn replies(&self) -> Vec<OutboundMessage> {
        self.platform.sent_to(SendTarget::Channel(self.world.channel.id))
    }

    pub fn last_reply(&self) -> OutboundMessage {
        self.replies().pop().expect("a channel reply")
    }

    pub fn owner_dms(&self) -> Vec<OutboundMessage> {
        self.platform.sent_to(SendTarget::User(OWNER_ID.into()))
    }

    pub fn clear(&self) {
        self.platform.take_sent();
    }

    pub fn hook_calls(&self) -> Vec<String> {
        self.hooks.lock().clone()
    }
}

// ===== Greeter fixture =====

/// Counts greetings; resolved by `greet` through the service registry.
pub struct GreeterService {
    greeted: AtomicUsize,
}

impl GreeterService {
    pub fn greeted(&self) -> usize {
        self.greeted.load(Ordering::SeqCst)
    }
}

impl ServiceClass for GreeterService {
    const NAME: &'static str = "GreeterService";

    fn construct(_bot: BotHandle) -> Self {
        Self {
            greeted: AtomicUsize::new(0),
        }
    }
}

impl Service for GreeterService {}

struct Greet;

#[async_trait]
impl CommandHandler for Greet {
    async fn run(&self, ctx: &CommandContext, response: &mut Response) -> Result<(), BotError> {
        let service = ctx.service::<GreeterService>("greeter", GreeterService::NAME)?;
        service.greeted.fetch_add(1, Ordering::SeqCst);

        let name = ctx.arg("name").unwrap_or_default();
        let greeting = ctx.arg("greeting").unwrap_or_default();
        let mut text = format!("{}, {}!", greeting, name);
        if ctx.flag("loud") {
            text = text.to_uppercase();
        }
        response.send_message(text).await
    }
}

struct Boom;

#[async_trait]
impl CommandHandler for Boom {
    async fn run(&self, _ctx: &CommandContext, _response: &mut Response) -> Result<(), BotError> {
        Err(anyhow::anyhow!("kaboom").into())
    }
}

struct Panics;

#[async_trait]
impl CommandHandler for Panics {
    async fn run(&self, _ctx: &CommandContext, _response: &mut Response) -> Result<(), BotError> {
        panic!("boom!");
    }
}

pub struct Reply(pub &'static str);

#[async_trait]
impl CommandHandler for Reply {
    async fn run(&self, _ctx: &CommandContext, response: &mut Response) -> Result<(), BotError> {
        response.send_message(self.0).await
    }
}

struct Count;

#[async_trait]
impl CommandHandler for Count {
    async fn run(&self, ctx: &CommandContext, response: &mut Response) -> Result<(), BotError> {
        let n = ctx.arg("n").unwrap_or_default();
        response.send_message(format!("counted {}", n)).await
    }
}

/// Records every hook call as `hook:detail`.
pub struct RecordingHooks {
    pub log: HookLog,
}

#[async_trait]
impl ModuleHooks for RecordingHooks {
    async fn on_enabled(&self, _bot: &Arc<Bot>, guild_id: GuildId) -> Result<(), BotError> {
        self.log.lock().push(format!("enabled:{}", guild_id));
        Ok(())
    }

    async fn on_disabled(&self, _bot: &Arc<Bot>, guild_id: GuildId) -> Result<(), BotError> {
        self.log.lock().push(format!("disabled:{}", guild_id));
        Ok(())
    }

    async fn on_listen(&self, _bot: &Arc<Bot>) -> Result<(), BotError> {
        self.log.lock().push("listen".to_string());
        Ok(())
    }

    async fn on_join_guild(&self, _bot: &Arc<Bot>, guild: &Guild) -> Result<(), BotError> {
        self.log.lock().push(format!("join:{}", guild.id));
        Ok(())
    }
}

/// `greet`, `boom`, `panic`, `secret` (mod only), `quiet` (off by default)
/// and `count` (integer arg).
pub fn greeter_module(log: HookLog) -> ModuleDescriptor {
    ModuleDescriptor::new("greeter")
        .description("Says hello")
        .service::<GreeterService>()
        .hooks(RecordingHooks { log })
        .command(
            CommandDescriptor::new("greet")
                .description("Greet someone")
                .service("greeter", GreeterService::NAME)
                .arg(ArgSpec::required("name").description("who to greet"))
                .arg(ArgSpec::optional("greeting").default_value("Hello"))
                .flag(FlagSpec::boolean("loud").short('L').description("shout it"))
                .run(Greet),
        )
        .command(CommandDescriptor::new("boom").run(Boom))
        .command(CommandDescriptor::new("panic").run(Panics))
        .command(
            CommandDescriptor::new("secret")
                .permission("mod")
                .run(Reply("the cake is a lie")),
        )
        .command(
            CommandDescriptor::new("quiet")
                .enabled_by_default(false)
                .run(Reply("shh")),
        )
        .command(
            CommandDescriptor::new("count")
                .arg(ArgSpec::required("n").arg_type(ArgType::Integer))
                .run(Count),
        )
}

/// Poll `check` until it holds or about a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}
