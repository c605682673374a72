//! Command dispatch pipeline.
//!
//! ```text
//! Received -> PrefixMatched -> CommandResolved
//!   -> [can send] -> [enabled] -> [permitted] -> [help] -> [required args]
//!   -> run handler -> Completed
//! ```
//!
//! The first three filters halt silently. The help and required-args
//! filters answer with a usage embed before halting. Any error or panic
//! inside the filters or the handler is contained here: the user gets a
//! generic apology, the owner gets the diagnostic, and the loop moves on.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::Instrument;

use crate::application::context::CommandContext;
use crate::application::parser::CommandParser;
use crate::application::plugin::HELP_FLAG;
use crate::application::response::Response;
use crate::config::ResponseStrings;
use crate::domain::{EmbedField, Member, Message, OutboundMessage, SendTarget};
use crate::infrastructure::metrics;
use crate::shared::error::BotError;
use crate::startup::Bot;

use super::CommandService;

/// Why a filter stopped the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    CannotSend,
    CommandDisabled,
    PermissionDenied,
    HelpShown,
    MissingArgs,
}

/// Result of one filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Continue,
    Halt(HaltReason),
}

/// Terminal state of one message's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command for this bot
    Ignored,
    Halted(HaltReason),
    Completed,
    /// An error was contained and reported
    Failed,
}

impl DispatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Halted(HaltReason::CannotSend) => "cannot_send",
            Self::Halted(HaltReason::CommandDisabled) => "disabled",
            Self::Halted(HaltReason::PermissionDenied) => "forbidden",
            Self::Halted(HaltReason::HelpShown) => "help",
            Self::Halted(HaltReason::MissingArgs) => "missing_args",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl CommandService {
    /// Run one message through the pipeline. Never fails: errors are
    /// reported and turned into [`DispatchOutcome::Failed`].
    pub async fn run_command_for_msg(&self, message: &Message) -> DispatchOutcome {
        let Ok(bot) = self.bot.get() else {
            return DispatchOutcome::Ignored;
        };
        let Some(guild) = message.guild.clone().filter(|_| message.channel.is_text()) else {
            return DispatchOutcome::Ignored;
        };

        let prefixes = self.prefixes_for_message(message);
        let Some(name) = CommandParser::command_name(&message.content, &prefixes) else {
            return DispatchOutcome::Ignored;
        };
        let Ok(command) = self.command(&name) else {
            return DispatchOutcome::Ignored;
        };

        let params = CommandParser::params_string(&message.content, &prefixes).unwrap_or_default();
        let parsed = CommandParser::process_params(&command, &params);
        let member = message
            .member
            .clone()
            .unwrap_or_else(|| Member::new(guild.id, message.author.clone()));

        let ctx = CommandContext {
            bot: bot.clone(),
            message: message.clone(),
            guild,
            member,
            command: command.clone(),
            args: parsed.args,
            flags: parsed.flags,
            inputs: Default::default(),
        };
        let mut response = Response::new(bot.platform(), message.channel.id, message.author.clone());

        let span = tracing::info_span!(
            "dispatch",
            command = %command.name,
            guild_id = %ctx.guild.id,
            user_id = %message.author.id,
        );
        let started = Instant::now();

        let result = AssertUnwindSafe(self.run_pipeline(&bot, &ctx, &mut response))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                self.report_failure(&bot, &ctx, err).instrument(span).await;
                DispatchOutcome::Failed
            }
            Err(panic) => {
                let err = BotError::Panic(panic_message(panic.as_ref()));
                self.report_failure(&bot, &ctx, err).instrument(span).await;
                DispatchOutcome::Failed
            }
        };

        metrics::record_dispatch(&command.name, outcome.label(), started.elapsed());
        outcome
    }

    async fn run_pipeline(
        &self,
        bot: &Arc<Bot>,
        ctx: &CommandContext,
        response: &mut Response,
    ) -> Result<DispatchOutcome, BotError> {
        if let FilterOutcome::Halt(reason) = self.filter_can_send(bot, ctx).await? {
            return Ok(DispatchOutcome::Halted(reason));
        }
        if let FilterOutcome::Halt(reason) = self.filter_command_enabled(ctx).await? {
            return Ok(DispatchOutcome::Halted(reason));
        }
        let permitted = bot.permissions_service().filter_has_permission(ctx).await?;
        if let FilterOutcome::Halt(reason) = gate(permitted, HaltReason::PermissionDenied) {
            return Ok(DispatchOutcome::Halted(reason));
        }
        if let FilterOutcome::Halt(reason) = self.filter_help_flag(bot, ctx, response).await? {
            return Ok(DispatchOutcome::Halted(reason));
        }
        if let FilterOutcome::Halt(reason) = self.filter_missing_args(bot, ctx, response).await? {
            return Ok(DispatchOutcome::Halted(reason));
        }

        tracing::debug!("running command");
        ctx.command.handler.run(ctx, response).await?;
        Ok(DispatchOutcome::Completed)
    }

    async fn filter_can_send(&self, bot: &Bot, ctx: &CommandContext) -> Result<FilterOutcome, BotError> {
        let can_send = bot.platform().can_send(ctx.channel()).await?;
        tracing::debug!(can_send, "filter_can_send_message");
        Ok(gate(can_send, HaltReason::CannotSend))
    }

    async fn filter_command_enabled(&self, ctx: &CommandContext) -> Result<FilterOutcome, BotError> {
        let enabled = match self.is_command_enabled(ctx.guild.id, &ctx.command.name).await {
            Ok(enabled) => enabled,
            Err(BotError::CommandNotFound(_)) => false,
            Err(err) => return Err(err),
        };
        tracing::debug!(enabled, "filter_command_enabled");
        Ok(gate(enabled, HaltReason::CommandDisabled))
    }

    async fn filter_help_flag(
        &self,
        bot: &Bot,
        ctx: &CommandContext,
        response: &mut Response,
    ) -> Result<FilterOutcome, BotError> {
        if !ctx.flag(HELP_FLAG) {
            return Ok(FilterOutcome::Continue);
        }

        tracing::debug!("filter_help_flag: help requested");
        let embed = ctx.command.help_embed(&self.prefix(ctx.guild.id));
        response.send_embed(bot.responses().command_help.clone(), embed).await?;
        Ok(FilterOutcome::Halt(HaltReason::HelpShown))
    }

    async fn filter_missing_args(
        &self,
        bot: &Bot,
        ctx: &CommandContext,
        response: &mut Response,
    ) -> Result<FilterOutcome, BotError> {
        let command = &ctx.command;
        let skip = command
            .flags
            .iter()
            .any(|flag| flag.ignore_arg_reqs && ctx.flag(&flag.name));
        if skip {
            return Ok(FilterOutcome::Continue);
        }

        let missing: Vec<&str> = command
            .required_args()
            .filter(|arg| !ctx.args.contains_key(&arg.name))
            .map(|arg| arg.name.as_str())
            .collect();
        if missing.is_empty() {
            return Ok(FilterOutcome::Continue);
        }

        tracing::debug!(?missing, "filter_missing_args: required arguments missing");
        let embed = command.help_embed(&self.prefix(ctx.guild.id));
        response.send_embed(bot.responses().missing_argument.clone(), embed).await?;
        Ok(FilterOutcome::Halt(HaltReason::MissingArgs))
    }

    /// Apologize to the user, then send the owner a diagnostic. Failures
    /// while reporting are logged and swallowed.
    async fn report_failure(&self, bot: &Arc<Bot>, ctx: &CommandContext, err: BotError) {
        tracing::error!(error = %err, kind = err.name(), "command failed");
        metrics::record_dispatch_error(err.name());

        let owner = bot
            .owner()
            .map(|owner| owner.tag())
            .unwrap_or_else(|| "My owner".to_string());
        let apology = ResponseStrings::render(&bot.responses().unhandled_exception_for_user, &[("owner", owner.as_str())]);
        if let Err(send_err) = bot
            .platform()
            .send(SendTarget::Channel(ctx.channel().id), OutboundMessage::text(apology))
            .await
        {
            tracing::warn!(error = %send_err, "could not notify user about failure");
        }

        let fields = vec![
            EmbedField::new("Guild", ctx.guild.name.clone()),
            EmbedField::new("Channel", ctx.channel().name.clone()),
            EmbedField::new("User", ctx.user().tag()),
        ];
        bot.handle_error(&err, fields).await;
    }
}

fn gate(passed: bool, reason: HaltReason) -> FilterOutcome {
    if passed {
        FilterOutcome::Continue
    } else {
        FilterOutcome::Halt(reason)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
