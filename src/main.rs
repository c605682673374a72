//! # Botframe Console
//!
//! Runs a bot against the in-process platform so it can be driven from a
//! terminal. Every stdin line is posted by the owner in a single console
//! guild; everything the bot sends is printed.
//!
//! This is the entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - The local platform and the bot

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use botframe::config::Settings;
use botframe::domain::{Channel, Guild, Member, Message, OutboundMessage, SendTarget, User};
use botframe::infrastructure::platform::LocalPlatform;
use botframe::startup::BotBuilder;

const BOT_USER_ID: u64 = 1;
const CONSOLE_GUILD_ID: u64 = 100;
const CONSOLE_CHANNEL_ID: u64 = 101;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    botframe::telemetry::init_tracing(&settings.logger);

    info!(
        environment = %settings.environment,
        prefix = %settings.default_prefix,
        "Configuration loaded"
    );

    let owner_id = settings.owner_user_id.context("ownerUserId is required")?;
    let owner = User::new(owner_id, "owner");
    let guild = Guild::new(CONSOLE_GUILD_ID, "Console", owner_id);
    let channel = Channel::text(CONSOLE_CHANNEL_ID, guild.id, "console");

    let platform = Arc::new(LocalPlatform::new(User {
        bot: true,
        ..User::new(BOT_USER_ID, "botframe")
    }));
    platform.add_guild(guild.clone());
    platform.add_member(Member::new(guild.id, owner.clone()));
    platform.on_send(Arc::new(print_outbound));

    let bot = BotBuilder::new(settings).platform(platform.clone()).build().await?;
    bot.listen().await?;
    info!("Console ready, type commands below");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_message_id = 1_000u64;
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    next_message_id += 1;
                    let member = Member::new(guild.id, owner.clone());
                    platform.push_message(Message::in_guild(next_message_id, line, member, channel.clone(), guild.clone()))?;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    bot.shutdown().await?;
    bot.run_until_stopped().await?;
    info!("Bot stopped");
    tracing::debug!(metrics = %botframe::infrastructure::metrics::gather_metrics(), "final dispatch metrics");

    Ok(())
}

fn print_outbound(target: SendTarget, message: &OutboundMessage) {
    let to = match target {
        SendTarget::Channel(id) => format!("#{}", id),
        SendTarget::User(id) => format!("@{}", id),
    };
    if !message.content.is_empty() {
        println!("[{}] {}", to, message.content);
    }

    let Some(embed) = &message.embed else {
        return;
    };
    if let Some(title) = &embed.title {
        println!("  == {} ==", title);
    }
    if let Some(description) = &embed.description {
        println!("  {}", description);
    }
    for field in &embed.fields {
        println!("  {}:", field.name);
        for line in field.value.lines() {
            println!("    {}", line);
        }
    }
    if let Some(footer) = &embed.footer {
        println!("  -- {}", footer);
    }
}
