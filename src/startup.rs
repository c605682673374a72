//! Bot Startup and Runtime
//!
//! `BotBuilder` assembles a [`Bot`]: the service registry with the core
//! services, the built-in modules and any external modules. `Bot::listen`
//! then runs the startup barrier and spawns the event loop:
//!
//! ```text
//! configure services -> login -> find owner -> prepare data
//!   -> on_listen hooks -> join hooks per guild -> "online" DM -> event loop
//! ```
//!
//! No command is dispatched before the barrier completes. Join hooks run
//! concurrently across guilds and one at a time per guild.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use futures::future::join_all;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::builtin;
use crate::application::plugin::{Command, CommandDescriptor, Module, ModuleDescriptor, ModuleRegistry};
use crate::application::services::{
    CommandService, ConfigActionService, DataService, ModuleService, PermissionsService, Service, ServiceClass,
    ServiceEntry, ServiceInstance, ServiceRegistry, UserService, CORE_NAMESPACE,
};
use crate::config::{ResponseStrings, Settings};
use crate::domain::{
    ChatPlatform, Embed, EmbedField, Guild, GuildDataRepository, GuildId, OutboundMessage, PlatformEvent,
    SendTarget, User,
};
use crate::infrastructure::data::open_data_source;
use crate::shared::error::BotError;

/// Embed fields are capped near this many characters.
const STACK_FIELD_LIMIT: usize = 1000;

// ===== Handle =====

/// Weak reference to the running bot, held by every service.
#[derive(Debug, Clone)]
pub struct BotHandle(Weak<Bot>);

impl BotHandle {
    pub fn new(bot: Weak<Bot>) -> Self {
        Self(bot)
    }

    pub fn get(&self) -> Result<Arc<Bot>, BotError> {
        self.0.upgrade().ok_or(BotError::RuntimeGone)
    }
}

// ===== Builder =====

pub struct BotBuilder {
    settings: Settings,
    platform: Option<Arc<dyn ChatPlatform>>,
    data_store: Option<Arc<dyn GuildDataRepository>>,
    services: Vec<(String, ServiceEntry)>,
    modules: Vec<ModuleDescriptor>,
}

impl BotBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            platform: None,
            data_store: None,
            services: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn platform(mut self, platform: Arc<dyn ChatPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use this store instead of the one `data_source` selects.
    pub fn data_store(mut self, store: Arc<dyn GuildDataRepository>) -> Self {
        self.data_store = Some(store);
        self
    }

    /// A standalone service outside any module.
    pub fn service<S: ServiceClass>(mut self, namespace: impl Into<String>) -> Self {
        self.services.push((namespace.into(), ServiceEntry::of::<S>()));
        self
    }

    /// An external module, loaded after the built-in ones.
    pub fn module(mut self, module: ModuleDescriptor) -> Self {
        self.modules.push(module);
        self
    }

    pub async fn build(self) -> Result<Arc<Bot>, BotError> {
        self.settings.verify()?;

        let platform = self
            .platform
            .ok_or_else(|| BotError::InvalidConfig("a chat platform is required".into()))?;
        let data_store = match self.data_store {
            Some(store) => store,
            None => open_data_source(&self.settings.data_source).await?,
        };

        let settings = self.settings;
        let bot = Arc::new_cyclic(|weak: &Weak<Bot>| Bot::new(BotHandle::new(weak.clone()), settings, platform, data_store));

        bot.register_core_services()?;
        for module in builtin::core_modules() {
            bot.add_module(module)?;
        }
        for (namespace, entry) in self.services {
            bot.services.add(&namespace, entry, bot.handle.clone())?;
        }
        for module in self.modules {
            bot.add_module(module)?;
        }

        tracing::debug!(
            services = bot.services.len(),
            modules = bot.modules.len(),
            "bot assembled"
        );
        Ok(bot)
    }
}

// ===== Bot =====

struct CoreServices {
    data: Arc<DataService>,
    module: Arc<ModuleService>,
    command: Arc<CommandService>,
    config_action: Arc<ConfigActionService>,
    permissions: Arc<PermissionsService>,
    user: Arc<UserService>,
}

enum ListenState {
    /// The startup barrier is running. The state lock is not held meanwhile,
    /// so hooks may query the bot.
    Starting,
    Listening {
        shutdown: watch::Sender<bool>,
        task: Option<JoinHandle<()>>,
    },
}

/// The bot runtime context.
pub struct Bot {
    handle: BotHandle,
    settings: Settings,
    platform: Arc<dyn ChatPlatform>,
    data_store: Arc<dyn GuildDataRepository>,
    services: ServiceRegistry,
    modules: ModuleRegistry,
    core: CoreServices,
    owner: RwLock<Option<User>>,
    bot_user: RwLock<Option<User>>,
    registration_closed: AtomicBool,
    listen_state: Mutex<Option<ListenState>>,
    guild_locks: DashMap<GuildId, Arc<Mutex<()>>>,
}

impl Bot {
    fn new(
        handle: BotHandle,
        settings: Settings,
        platform: Arc<dyn ChatPlatform>,
        data_store: Arc<dyn GuildDataRepository>,
    ) -> Self {
        let core = CoreServices {
            data: Arc::new(DataService::construct(handle.clone())),
            module: Arc::new(ModuleService::construct(handle.clone())),
            command: Arc::new(CommandService::construct(handle.clone())),
            config_action: Arc::new(ConfigActionService::construct(handle.clone())),
            permissions: Arc::new(PermissionsService::construct(handle.clone())),
            user: Arc::new(UserService::construct(handle.clone())),
        };

        Self {
            handle,
            settings,
            platform,
            data_store,
            services: ServiceRegistry::new(),
            modules: ModuleRegistry::new(),
            core,
            owner: RwLock::new(None),
            bot_user: RwLock::new(None),
            registration_closed: AtomicBool::new(false),
            listen_state: Mutex::new(None),
            guild_locks: DashMap::new(),
        }
    }

    fn register_core_services(&self) -> Result<(), BotError> {
        let core = &self.core;
        self.register_core(core.data.clone())?;
        self.register_core(core.module.clone())?;
        self.register_core(core.command.clone())?;
        self.register_core(core.config_action.clone())?;
        self.register_core(core.permissions.clone())?;
        self.register_core(core.user.clone())?;
        Ok(())
    }

    fn register_core<S: ServiceClass>(&self, service: Arc<S>) -> Result<(), BotError> {
        self.services
            .insert(CORE_NAMESPACE, S::NAME, ServiceInstance::new(service))
            .map(|_| ())
    }

    // ===== Accessors =====

    pub fn handle(&self) -> BotHandle {
        self.handle.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn responses(&self) -> &ResponseStrings {
        &self.settings.response_strings
    }

    pub fn platform(&self) -> Arc<dyn ChatPlatform> {
        self.platform.clone()
    }

    pub fn data_store(&self) -> Arc<dyn GuildDataRepository> {
        self.data_store.clone()
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Resolve a registered service at its concrete type.
    pub fn service<S: Service>(&self, namespace: &str, name: &str) -> Result<Arc<S>, BotError> {
        self.services.get::<S>(namespace, name)
    }

    pub fn data_service(&self) -> Arc<DataService> {
        self.core.data.clone()
    }

    pub fn module_service(&self) -> Arc<ModuleService> {
        self.core.module.clone()
    }

    pub fn command_service(&self) -> Arc<CommandService> {
        self.core.command.clone()
    }

    pub fn config_action_service(&self) -> Arc<ConfigActionService> {
        self.core.config_action.clone()
    }

    pub fn permissions_service(&self) -> Arc<PermissionsService> {
        self.core.permissions.clone()
    }

    pub fn user_service(&self) -> Arc<UserService> {
        self.core.user.clone()
    }

    /// All modules in registration order.
    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.modules()
    }

    pub fn module(&self, name: &str) -> Result<Arc<Module>, BotError> {
        self.modules.get(name)
    }

    /// The bot owner, known once `listen` found them.
    pub fn owner(&self) -> Option<User> {
        self.owner.read().clone()
    }

    /// The bot's own account, known once logged in.
    pub fn bot_user(&self) -> Option<User> {
        self.bot_user.read().clone()
    }

    pub async fn is_listening(&self) -> bool {
        matches!(*self.listen_state.lock().await, Some(ListenState::Listening { .. }))
    }

    // ===== Registration =====

    fn ensure_registration_open(&self) -> Result<(), BotError> {
        if self.registration_closed.load(Ordering::SeqCst) {
            return Err(BotError::InvalidConfig(
                "modules and commands can not be added once the bot is listening".into(),
            ));
        }
        Ok(())
    }

    /// Register a module: its services, config actions, commands, then
    /// permission levels.
    pub fn add_module(&self, descriptor: ModuleDescriptor) -> Result<(), BotError> {
        self.ensure_registration_open()?;

        let module = Module::from_descriptor(descriptor)?;
        if self.modules.get(&module.name).is_ok() {
            return Err(BotError::ModuleAlreadyExists(module.name));
        }

        for entry in &module.services {
            self.services.add(&module.name, *entry, self.handle.clone())?;
        }
        for action in &module.config_actions {
            self.core.config_action.add_action(action.clone())?;
        }
        for command in &module.commands {
            self.core.command.add_command(command.clone())?;
        }
        for level in &module.permission_levels {
            self.core.permissions.add_permission_level(level);
        }

        tracing::debug!(
            module = %module.name,
            commands = module.commands.len(),
            config_actions = module.config_actions.len(),
            "module added"
        );
        self.modules.add(module)?;
        Ok(())
    }

    /// Register a command outside its module's descriptor. The module must
    /// already be registered.
    pub fn add_command(&self, descriptor: CommandDescriptor) -> Result<(), BotError> {
        self.ensure_registration_open()?;

        let command = Command::from_descriptor(descriptor, None)?;
        self.modules.get(&command.module_name)?;
        self.core.command.add_command(Arc::new(command))
    }

    // ===== Lifecycle =====

    /// Run the startup barrier and start processing events. Calling it
    /// again while starting or listening is a no-op.
    pub async fn listen(self: &Arc<Self>) -> Result<(), BotError> {
        {
            let mut state = self.listen_state.lock().await;
            if state.is_some() {
                tracing::warn!("listen called while already listening");
                return Ok(());
            }
            *state = Some(ListenState::Starting);
        }

        match self.run_startup_barrier().await {
            Ok((shutdown, task)) => {
                *self.listen_state.lock().await = Some(ListenState::Listening {
                    shutdown,
                    task: Some(task),
                });
                tracing::info!("ready");
                Ok(())
            }
            Err(err) => {
                *self.listen_state.lock().await = None;
                Err(err)
            }
        }
    }

    async fn run_startup_barrier(self: &Arc<Self>) -> Result<(watch::Sender<bool>, JoinHandle<()>), BotError> {
        tracing::info!("beginning to listen");
        self.registration_closed.store(true, Ordering::SeqCst);
        self.log_stats();

        tracing::info!("configuring services");
        self.services.configure_services(&self.settings).await?;

        tracing::info!("logging in");
        let token = self.settings.login_token.clone().unwrap_or_default();
        let me = self.platform.login(&token).await?;
        *self.bot_user.write() = Some(me);

        let guilds = self.platform.guilds().await?;
        tracing::info!(guilds = guilds.len(), "logged in");

        let owner = self.find_owner().await?;
        tracing::info!(owner = %owner.tag(), "found owner");

        let events = self.platform.events();

        self.run_listen_hooks(&guilds).await?;
        join_all(guilds.iter().map(|guild| self.join_guild(guild))).await;

        if self.settings.message_owner_on_boot {
            if let Err(err) = self.message_owner(self.responses().online.clone(), None).await {
                tracing::warn!(error = %err, "could not send online message to owner");
            }
        }

        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(self.clone().event_loop(events, signal));
        Ok((shutdown, task))
    }

    /// Wait until the event loop ends.
    pub async fn run_until_stopped(&self) -> Result<(), BotError> {
        let task = match self.listen_state.lock().await.as_mut() {
            Some(ListenState::Listening { task, .. }) => task.take(),
            _ => return Err(BotError::NotListening),
        };

        match task {
            Some(task) => task.await.map_err(|err| BotError::Other(err.into())),
            None => Ok(()),
        }
    }

    /// Stop the event loop and close the platform connection. In-flight
    /// dispatches are not awaited.
    pub async fn shutdown(&self) -> Result<(), BotError> {
        let state = self.listen_state.lock().await;
        let Some(ListenState::Listening { shutdown, .. }) = state.as_ref() else {
            return Err(BotError::NotListening);
        };

        tracing::info!("shutdown signal received");
        if shutdown.send(true).is_err() {
            tracing::debug!("event loop already stopped");
        }
        Ok(())
    }

    fn log_stats(&self) {
        tracing::info!(
            services = self.services.len(),
            modules = self.modules.len(),
            commands = self.core.command.commands().len(),
            "loaded"
        );
    }

    async fn find_owner(&self) -> Result<User, BotError> {
        let owner_id = self.settings.owner_user_id.ok_or(BotError::OwnerNotFound)?;
        let owner = self.platform.fetch_user(owner_id).await.map_err(|err| {
            tracing::error!(%owner_id, error = %err, "could not fetch owner");
            BotError::OwnerNotFound
        })?;

        *self.owner.write() = Some(owner.clone());
        Ok(owner)
    }

    /// Data service first, then default data for every guild, then the
    /// remaining services and the modules. Hook failures are reported, not
    /// fatal.
    async fn run_listen_hooks(self: &Arc<Self>, guilds: &[Guild]) -> Result<(), BotError> {
        tracing::info!("preparing data source");
        self.core.data.on_listen().await?;
        for guild in guilds {
            self.core.module.prepare_default_data(guild.id).await?;
        }
        tracing::info!("data source prepared");

        for (name, service) in self.other_services() {
            if let Err(err) = service.on_listen().await {
                self.handle_error(&err, hook_fields("on_listen", "Service", &name)).await;
            }
        }
        for module in self.modules() {
            if let Err(err) = module.hooks.on_listen(self).await {
                self.handle_error(&err, hook_fields("on_listen", "Module", &module.name)).await;
            }
        }

        tracing::info!("on_listen hooks complete");
        Ok(())
    }

    /// Join initialization for one guild, serialized per guild.
    async fn join_guild(self: &Arc<Self>, guild: &Guild) {
        let lock = self
            .guild_locks
            .entry(guild.id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        tracing::info!(guild_id = %guild.id, guild = %guild.name, "starting join hooks");
        let guild_field = || EmbedField::new("Guild", format!("{} ({})", guild.name, guild.id));

        if let Err(err) = self.core.data.on_join_guild(guild).await {
            self.handle_error(&err, vec![guild_field()]).await;
        }
        if let Err(err) = self.core.module.prepare_default_data(guild.id).await {
            self.handle_error(&err, vec![guild_field()]).await;
        }

        for (name, service) in self.other_services() {
            if let Err(err) = service.on_join_guild(guild).await {
                let mut fields = hook_fields("on_join_guild", "Service", &name);
                fields.insert(1, guild_field());
                self.handle_error(&err, fields).await;
            }
        }
        for module in self.modules() {
            if let Err(err) = module.hooks.on_join_guild(self, guild).await {
                let mut fields = hook_fields("on_join_guild", "Module", &module.name);
                fields.insert(1, guild_field());
                self.handle_error(&err, fields).await;
            }
        }

        tracing::info!(guild_id = %guild.id, "completed join hooks");
    }

    /// Registered services except the data service.
    fn other_services(&self) -> Vec<(String, Arc<dyn Service>)> {
        let data_key = format!("{}.{}", CORE_NAMESPACE, DataService::NAME).to_lowercase();
        self.services
            .services()
            .into_iter()
            .filter(|(key, _)| *key != data_key)
            .collect()
    }

    async fn event_loop(self: Arc<Self>, mut events: BoxStream<'static, PlatformEvent>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("event streams started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("shutting down");
                        break;
                    }
                }
                event = events.next() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        tracing::info!("platform event stream ended");
                        break;
                    }
                }
            }
        }

        tracing::info!("closing platform connection");
        match self.platform.destroy().await {
            Ok(()) => tracing::info!("platform connection closed"),
            Err(err) => tracing::warn!(error = %err, "failed to close platform connection"),
        }
    }

    fn handle_event(self: &Arc<Self>, event: PlatformEvent) {
        match event {
            PlatformEvent::MessageReceived(message) => {
                if self.bot_user().is_some_and(|me| me.id == message.author.id) {
                    return;
                }
                if !message.channel.is_text() || !self.core.command.msg_is_command(&message) {
                    return;
                }

                let bot = self.clone();
                tokio::spawn(async move {
                    bot.core.command.run_command_for_msg(&message).await;
                });
            }
            PlatformEvent::GuildJoined(guild) => {
                let bot = self.clone();
                tokio::spawn(async move {
                    bot.join_guild(&guild).await;
                });
            }
        }
    }

    // ===== Operator reporting =====

    /// Direct message the bot owner.
    pub async fn message_owner(&self, content: impl Into<String>, embed: Option<Embed>) -> Result<(), BotError> {
        let owner = self.owner().ok_or(BotError::OwnerNotFound)?;
        let message = OutboundMessage {
            content: content.into(),
            embed,
        };
        self.platform.send(SendTarget::User(owner.id), message).await
    }

    /// Log the error and send the owner a diagnostic. Never fails.
    pub async fn handle_error(&self, err: &BotError, extra_fields: Vec<EmbedField>) {
        let incident = Uuid::new_v4();
        tracing::error!(%incident, kind = err.name(), error = %err, chain = %err.chain(), "unhandled error");

        let embed = Self::create_embed_for_error(err, extra_fields).footer(format!("Incident {}", incident));
        let content = self.responses().unhandled_exception_for_owner.clone();
        if let Err(report_err) = self.message_owner(content, Some(embed)).await {
            tracing::warn!(%incident, error = %report_err, "could not report error to owner");
        }
    }

    /// `Error:` (`name: message`), the extra fields, then `Stack:`.
    pub fn create_embed_for_error(err: &BotError, extra_fields: Vec<EmbedField>) -> Embed {
        Embed::new()
            .field("Error:", format!("{}: {}", err.name(), err))
            .fields(extra_fields)
            .field("Stack:", stack_for_embed(&err.chain()))
            .timestamp_now()
    }
}

fn hook_fields(hook: &str, listener_type: &str, listener_name: &str) -> Vec<EmbedField> {
    vec![
        EmbedField::new("Hook", hook),
        EmbedField::new("Listener Type", listener_type),
        EmbedField::new("Listener Name", listener_name),
    ]
}

/// Whole lines of `stack` up to about [`STACK_FIELD_LIMIT`] characters,
/// with `...` when lines were cut.
fn stack_for_embed(stack: &str) -> String {
    let mut lines = stack.lines();
    let mut rendered = String::new();

    let mut next = lines.next();
    while let Some(line) = next {
        if format!("{}\n{}\n...", rendered, line).len() >= STACK_FIELD_LIMIT {
            break;
        }
        if !rendered.is_empty() {
            rendered.push('\n');
        }
        rendered.push_str(line);
        next = lines.next();
    }

    match next {
        // A single oversized line is cut rather than dropped.
        Some(line) if rendered.is_empty() => {
            let mut end = line.len().min(STACK_FIELD_LIMIT - 4);
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &line[..end])
        }
        Some(_) => {
            rendered.push_str("\n...");
            rendered
        }
        None => rendered,
    }
}
