use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;

use crate::domain::{
    Channel, ChannelId, ChatPlatform, Guild, GuildId, Member, Message, OutboundMessage, PlatformEvent, Role,
    SendTarget, User, UserId,
};
use crate::shared::error::BotError;

/// Called for every delivered message.
pub type OutboundTap = Arc<dyn Fn(SendTarget, &OutboundMessage) + Send + Sync>;

#[derive(Default)]
struct World {
    users: HashMap<UserId, User>,
    guilds: Vec<Guild>,
    members: HashMap<GuildId, Vec<Member>>,
    roles: HashMap<GuildId, Vec<Role>>,
    muted: HashSet<ChannelId>,
}

pub struct LocalPlatform {
    bot_user: User,
    world: RwLock<World>,
    sent: Mutex<Vec<(SendTarget, OutboundMessage)>>,
    sent_notify: Notify,
    events_tx: mpsc::UnboundedSender<PlatformEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<PlatformEvent>>>,
    tap: RwLock<Option<OutboundTap>>,
}

impl LocalPlatform {
    pub fn new(bot_user: User) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded();
        let mut world = World::default();
        world.users.insert(bot_user.id, bot_user.clone());

        Self {
            bot_user,
            world: RwLock::new(world),
            sent: Mutex::new(Vec::new()),
            sent_notify: Notify::new(),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            tap: RwLock::new(None),
        }
    }

    pub fn bot_user(&self) -> &User {
        &self.bot_user
    }

    // ===== World =====

    pub fn add_user(&self, user: User) {
        self.world.write().users.insert(user.id, user);
    }

    pub fn add_guild(&self, guild: Guild) {
        let mut world = self.world.write();
        world.guilds.retain(|known| known.id != guild.id);
        world.guilds.push(guild);
    }

    pub fn add_member(&self, member: Member) {
        let mut world = self.world.write();
        world.users.insert(member.user.id, member.user.clone());
        let members = world.members.entry(member.guild_id).or_default();
        members.retain(|known| known.user.id != member.user.id);
        members.push(member);
    }

    pub fn add_role(&self, role: Role) {
        self.world.write().roles.entry(role.guild_id).or_default().push(role);
    }

    /// The bot loses send permission in this channel.
    pub fn mute_channel(&self, channel_id: ChannelId) {
        self.world.write().muted.insert(channel_id);
    }

    pub fn unmute_channel(&self, channel_id: ChannelId) {
        self.world.write().muted.remove(&channel_id);
    }

    // ===== Events =====

    pub fn push_event(&self, event: PlatformEvent) -> Result<(), BotError> {
        self.events_tx
            .unbounded_send(event)
            .map_err(|_| BotError::Platform("event stream is closed".into()))
    }

    pub fn push_message(&self, message: Message) -> Result<(), BotError> {
        self.push_event(PlatformEvent::MessageReceived(message))
    }

    /// Join a guild and announce it to the bot.
    pub fn join_guild(&self, guild: Guild) -> Result<(), BotError> {
        self.add_guild(guild.clone());
        self.push_event(PlatformEvent::GuildJoined(guild))
    }

    // ===== Outbound =====

    pub fn on_send(&self, tap: OutboundTap) {
        *self.tap.write() = Some(tap);
    }

    /// Everything delivered so far, oldest first.
    pub fn sent(&self) -> Vec<(SendTarget, OutboundMessage)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, target: SendTarget) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == target)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn take_sent(&self) -> Vec<(SendTarget, OutboundMessage)> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Wait until at least `count` messages were delivered. Returns false on
    /// timeout.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.sent_notify.notified();
                if self.sent.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[async_trait]
impl ChatPlatform for LocalPlatform {
    async fn login(&self, token: &str) -> Result<User, BotError> {
        if token.trim().is_empty() {
            return Err(BotError::Platform("login token rejected".into()));
        }
        tracing::debug!(user = %self.bot_user.tag(), "logged in to local platform");
        Ok(self.bot_user.clone())
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<User, BotError> {
        self.world
            .read()
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| BotError::UserNotFound(user_id.to_string()))
    }

    async fn guilds(&self) -> Result<Vec<Guild>, BotError> {
        Ok(self.world.read().guilds.clone())
    }

    async fn members(&self, guild_id: GuildId) -> Result<Vec<Member>, BotError> {
        Ok(self.world.read().members.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn roles(&self, guild_id: GuildId) -> Result<Vec<Role>, BotError> {
        Ok(self.world.read().roles.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn can_send(&self, channel: &Channel) -> Result<bool, BotError> {
        Ok(!self.world.read().muted.contains(&channel.id))
    }

    async fn send(&self, target: SendTarget, message: OutboundMessage) -> Result<(), BotError> {
        if let Some(tap) = self.tap.read().clone() {
            tap(target, &message);
        }
        self.sent.lock().push((target, message));
        self.sent_notify.notify_waiters();
        Ok(())
    }

    fn events(&self) -> BoxStream<'static, PlatformEvent> {
        match self.events_rx.lock().take() {
            Some(receiver) => receiver.boxed(),
            None => {
                tracing::warn!("local platform event stream was already taken");
                stream::empty().boxed()
            }
        }
    }

    async fn destroy(&self) -> Result<(), BotError> {
        self.events_tx.close_channel();
        tracing::debug!("local platform destroyed");
        Ok(())
    }
}
