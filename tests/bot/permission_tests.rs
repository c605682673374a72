//! Permission level tests

use futures::future::join_all;
use pretty_assertions::assert_eq;

use botframe::application::services::{DispatchOutcome, HaltReason};
use botframe::domain::{User, UserId};

use crate::common::{TestBot, MOD_ROLE_ID};

const DENIED: DispatchOutcome = DispatchOutcome::Halted(HaltReason::PermissionDenied);

#[tokio::test]
async fn test_restricted_command_denied_without_grant() {
    let test = TestBot::new().await;

    assert_eq!(test.send(&test.world.member, "!secret").await, DENIED);
    assert!(test.platform.sent().is_empty());
}

#[tokio::test]
async fn test_owners_bypass_levels() {
    let test = TestBot::new().await;

    let guild_owner = test.world.guild_owner.clone();
    assert_eq!(test.send(&guild_owner, "!secret").await, DispatchOutcome::Completed);

    let bot_owner = test.world.owner.clone();
    assert_eq!(test.send(&bot_owner, "!secret").await, DispatchOutcome::Completed);
    assert_eq!(test.last_reply().content, "the cake is a lie");
}

#[tokio::test]
async fn test_role_grant() {
    let test = TestBot::new().await;
    let moderator = test.world.member.clone().with_roles([MOD_ROLE_ID.into()]);

    assert_eq!(test.send(&moderator, "!secret").await, DENIED);

    assert_eq!(
        test.config("permissions addRole Moderators mod").await,
        "Added Moderators to mod"
    );
    assert_eq!(test.send(&moderator, "!secret").await, DispatchOutcome::Completed);
    assert_eq!(test.send(&test.world.member, "!secret").await, DENIED);

    assert_eq!(
        test.config(&format!("permissions rmRole <@&{}> mod", MOD_ROLE_ID)).await,
        "Removed Moderators from mod"
    );
    assert_eq!(test.send(&moderator, "!secret").await, DENIED);
}

#[tokio::test]
async fn test_user_grant_by_mention() {
    let test = TestBot::new().await;
    let member = test.world.member.clone();
    let tag = member.user.tag();

    assert_eq!(
        test.config(&format!("permissions addUser {} mod", member.user.mention())).await,
        format!("Added {} to mod", tag)
    );
    assert_eq!(test.send(&member, "!secret").await, DispatchOutcome::Completed);

    assert_eq!(
        test.config(&format!("permissions rmUser {} MOD", member.user.username)).await,
        format!("Removed {} from mod", tag)
    );
    assert_eq!(test.send(&member, "!secret").await, DENIED);
}

#[tokio::test]
async fn test_admin_grant_unlocks_config() {
    let test = TestBot::new().await;
    let member = test.world.member.clone();

    assert_eq!(test.send(&member, "!config core setPrefix ?").await, DENIED);

    test.config(&format!("permissions addUser {} admin", member.user.mention()))
        .await;
    assert_eq!(
        test.send(&member, "!config core setPrefix ?").await,
        DispatchOutcome::Completed
    );
}

#[tokio::test]
async fn test_grant_errors_are_shown() {
    let test = TestBot::new().await;

    assert_eq!(
        test.config("permissions addRole Moderators wizard").await,
        "Permission level wizard does not exist."
    );
    assert_eq!(
        test.config("permissions addRole Ghosts mod").await,
        "Role Ghosts could not be found."
    );
    assert_eq!(
        test.config("permissions addUser ghost mod").await,
        "User 'ghost' could not be found"
    );
    assert_eq!(
        test.config("permissions addRole Moderators").await,
        "the permission level to add is required"
    );
    assert_eq!(
        test.config("permissions rmRole").await,
        "the role to remove is required"
    );
}

#[tokio::test]
async fn test_list_levels() {
    let test = TestBot::new().await;
    test.config("permissions addRole Moderators mod").await;

    test.config("permissions list").await;

    let reply = test.last_reply();
    assert_eq!(reply.content, "Here are the available permission levels:");
    let embed = reply.embed.expect("levels embed");
    assert_eq!(embed.field_value("Bot Owner* - *bypasses permissions*"), Some("owner"));
    assert_eq!(
        embed.field_value("Guild Owner* - *bypasses permissions*"),
        Some("guild-owner")
    );
    assert_eq!(embed.field_value("admin"), Some("**Users**: \n**Roles**: "));
    assert_eq!(embed.field_value("mod"), Some("**Users**: \n**Roles**: Moderators"));
    assert_eq!(embed.footer.as_deref(), Some("* Unassignable"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_user_grants_are_all_kept() {
    let test = TestBot::new().await;
    let guild_id = test.guild_id();

    let grants = (0..20u64).map(|n| {
        let bot = test.bot.clone();
        tokio::spawn(async move {
            let user = User::new(5_000 + n, format!("user-{}", n));
            let added = bot.permissions_service().add_user(guild_id, "mod", &user).await;
            added
        })
    });
    for grant in join_all(grants).await {
        grant.expect("grant task finishes").expect("user added");
    }

    let data = test
        .bot
        .permissions_service()
        .permission_data(guild_id, "mod")
        .await
        .expect("level data");
    let expected: Vec<UserId> = (0..20u64).map(|n| UserId::new(5_000 + n)).collect();
    assert_eq!(data.users.into_iter().collect::<Vec<_>>(), expected);
}
