//! Dispatch pipeline tests

use pretty_assertions::assert_eq;
use test_case::test_case;

use botframe::application::services::{DispatchOutcome, HaltReason};
use botframe::domain::{Channel, Message};

use crate::common::{GreeterService, TestBot, CHANNEL_ID, OWNER_ID};

#[tokio::test]
async fn test_greet_uses_defaults_and_service() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!greet Ada").await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(test.last_reply().content, "Hello, Ada!");

    let service = test
        .bot
        .service::<GreeterService>("greeter", "GreeterService")
        .expect("greeter service registered");
    assert_eq!(service.greeted(), 1);
}

#[test_case("!greet Ada Howdy", "Howdy, Ada!" ; "second arg")]
#[test_case("!greet Ada Good morning", "Good morning, Ada!" ; "overflow joins into last arg")]
#[test_case("!greet \"Ada Lovelace\" Hi", "Hi, Ada Lovelace!" ; "quoted arg")]
#[test_case("!greet --loud Ada", "HELLO, ADA!" ; "long flag")]
#[test_case("!greet -L Ada", "HELLO, ADA!" ; "short flag")]
#[test_case("!GREET Ada", "Hello, Ada!" ; "command name is case insensitive")]
#[test_case("<@1> greet Ada", "Hello, Ada!" ; "mention prefix")]
#[test_case("<@!1> greet Ada", "Hello, Ada!" ; "nickname mention prefix")]
#[tokio::test]
async fn test_greet_parsing(content: &str, expected: &str) {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, content).await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(test.last_reply().content, expected);
}

#[test_case("hello there" ; "no prefix")]
#[test_case("!" ; "bare prefix")]
#[test_case("!unknown thing" ; "unknown command")]
#[test_case("?greet Ada" ; "other prefix")]
#[tokio::test]
async fn test_non_commands_are_ignored(content: &str) {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, content).await;

    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert!(test.platform.sent().is_empty());
}

#[tokio::test]
async fn test_direct_messages_are_ignored() {
    let test = TestBot::new().await;
    let message = Message::direct(5, "!greet Ada", test.world.member.user.clone(), Channel::dm(77));

    let outcome = test.bot.command_service().run_command_for_msg(&message).await;

    assert_eq!(outcome, DispatchOutcome::Ignored);
}

#[tokio::test]
async fn test_missing_args_sends_help() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!greet").await;

    assert_eq!(outcome, DispatchOutcome::Halted(HaltReason::MissingArgs));
    let reply = test.last_reply();
    assert_eq!(
        reply.content,
        "I'm sorry, but I'm missing some information for that command:"
    );
    let embed = reply.embed.expect("help embed");
    assert_eq!(embed.title.as_deref(), Some("greet"));
}

#[tokio::test]
async fn test_help_flag_wins_over_missing_args() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!greet --help").await;

    assert_eq!(outcome, DispatchOutcome::Halted(HaltReason::HelpShown));
    assert_eq!(test.last_reply().content, "Here's how to use that command:");
}

#[tokio::test]
async fn test_short_help_flag() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!greet Ada -h").await;

    assert_eq!(outcome, DispatchOutcome::Halted(HaltReason::HelpShown));
}

#[tokio::test]
async fn test_muted_channel_halts_silently() {
    let test = TestBot::new().await;
    test.platform.mute_channel(CHANNEL_ID.into());

    let outcome = test.send(&test.world.member, "!greet Ada").await;

    assert_eq!(outcome, DispatchOutcome::Halted(HaltReason::CannotSend));
    assert!(test.platform.sent().is_empty());
}

#[tokio::test]
async fn test_disabled_by_default_command_halts() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!quiet").await;

    assert_eq!(outcome, DispatchOutcome::Halted(HaltReason::CommandDisabled));
    assert!(test.platform.sent().is_empty());
}

#[tokio::test]
async fn test_integer_arg_that_does_not_parse_is_missing() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!count many").await;
    assert_eq!(outcome, DispatchOutcome::Halted(HaltReason::MissingArgs));

    let outcome = test.send(&test.world.member, "!count 42").await;
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(test.last_reply().content, "counted 42");
}

#[tokio::test]
async fn test_handler_error_is_contained_and_reported() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!boom").await;

    assert_eq!(outcome, DispatchOutcome::Failed);

    let apology = test.last_reply().content;
    assert!(apology.starts_with("I'm sorry, but there was an unexpected problem"));
    assert!(apology.contains("owner has been notified"));

    let dms = test.owner_dms();
    assert_eq!(dms.len(), 1);
    assert_eq!(
        dms[0].content,
        "I encountered an unhandled exception while running a command:"
    );
    let embed = dms[0].embed.as_ref().expect("diagnostic embed");
    assert_eq!(embed.field_value("Error:"), Some("Error: kaboom"));
    assert_eq!(embed.field_value("Guild"), Some("Test Guild"));
    assert_eq!(embed.field_value("Channel"), Some("general"));
    assert_eq!(embed.field_value("User"), Some(test.world.member.user.tag().as_str()));
    assert!(embed.field_value("Stack:").is_some());
    assert!(embed.footer.as_deref().is_some_and(|footer| footer.starts_with("Incident ")));
}

#[tokio::test]
async fn test_handler_panic_is_contained() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!panic").await;

    assert_eq!(outcome, DispatchOutcome::Failed);
    let dms = test.platform.sent_to(botframe::domain::SendTarget::User(OWNER_ID.into()));
    let embed = dms[0].embed.as_ref().expect("diagnostic embed");
    assert_eq!(embed.field_value("Error:"), Some("PanicError: Command panicked: boom!"));

    // the bot keeps working afterwards
    assert_eq!(test.send(&test.world.member, "!greet Ada").await, DispatchOutcome::Completed);
}

#[tokio::test]
async fn test_help_lists_enabled_commands_by_module() {
    let test = TestBot::new().await;

    let outcome = test.send(&test.world.member, "!help").await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    let reply = test.last_reply();
    assert_eq!(reply.content, "Here are all my available commands:");

    let embed = reply.embed.expect("help embed");
    assert_eq!(embed.description.as_deref(), Some("For more info: !help `command`"));
    let greeter = embed.field_value("greeter").expect("greeter field");
    assert!(greeter.contains("- Greet someone"));
    assert!(!greeter.contains("!quiet"));
    assert!(embed.field_value("core").is_some_and(|core| core.contains("!help")));
}

#[tokio::test]
async fn test_help_for_one_command() {
    let test = TestBot::new().await;

    test.send(&test.world.member, "!help greet").await;
    let reply = test.last_reply();
    assert_eq!(reply.content, "Here's how to use that command:");
    assert_eq!(reply.embed.and_then(|embed| embed.title), Some("greet".to_string()));

    test.send(&test.world.member, "!help nope").await;
    assert_eq!(test.last_reply().content, "Command nope does not exist");
}
