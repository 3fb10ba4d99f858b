//! Prefix commands (`?dl`, `?ffd`, `?ffdu`) and their dispatch onto the
//! engine. This is where user ids typed by a person get resolved; the engine
//! itself only ever sees typed ids.

use tracing::debug;

use sweep_types::{ChannelId, MessageId, UserId};

use crate::engine::PurgeEngine;
use crate::error::{CommandError, PurgeError, Result};
use crate::request::PurgeResult;

/// Window used by `dl` when the caller gives no count, or targets everyone.
const TODAY_WINDOW_DAYS: u32 = 1;
/// Window used by `dl <user> <count>`.
const USER_COUNT_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTopic {
    Flag,
    UserFlag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `dl all [n]` / `dl <user> [n]`
    Delete {
        author: Option<UserId>,
        count: Option<usize>,
    },
    FlagCreate(String),
    FlagExecute(String),
    UserFlagCreate(UserId),
    UserFlagExecute(UserId),
    Usage(UsageTopic),
}

impl Command {
    /// Age window for a `Delete` command: one day unless a count is given for
    /// a specific user, in which case the full retention window.
    pub fn window_days(&self) -> Option<u32> {
        match self {
            Command::Delete {
                author: Some(_),
                count: Some(_),
            } => Some(USER_COUNT_WINDOW_DAYS),
            Command::Delete { .. } => Some(TODAY_WINDOW_DAYS),
            _ => None,
        }
    }
}

/// Parse `text` as a command. Text that does not start with `prefix`, or
/// names an unknown command, is `Ok(None)`.
pub fn parse_command(prefix: &str, text: &str) -> std::result::Result<Option<Command>, CommandError> {
    let Some(body) = text.trim().strip_prefix(prefix) else {
        return Ok(None);
    };
    let mut args = body.split_whitespace();
    let Some(verb) = args.next() else {
        return Ok(None);
    };

    let command = match verb {
        "dl" => {
            let target = args.next().ok_or(CommandError::MissingArgument("target"))?;
            let author = match target {
                "all" => None,
                other => Some(parse_user(other)?),
            };
            let count = args
                .next()
                .map(|raw| raw.parse::<usize>().map_err(|_| CommandError::BadCount(raw.to_string())))
                .transpose()?;
            Command::Delete { author, count }
        }
        "ffd" => match args.next() {
            Some("create") => Command::FlagCreate(flag_name(args.next())?),
            Some("execute") => Command::FlagExecute(flag_name(args.next())?),
            _ => Command::Usage(UsageTopic::Flag),
        },
        "ffdu" => match args.next() {
            Some("create") => Command::UserFlagCreate(user_arg(args.next())?),
            Some("execute") => Command::UserFlagExecute(user_arg(args.next())?),
            _ => Command::Usage(UsageTopic::UserFlag),
        },
        _ => return Ok(None),
    };

    Ok(Some(command))
}

fn parse_user(raw: &str) -> std::result::Result<UserId, CommandError> {
    raw.parse::<UserId>()
        .map_err(|_| CommandError::InvalidTarget(raw.to_string()))
}

fn user_arg(raw: Option<&str>) -> std::result::Result<UserId, CommandError> {
    parse_user(raw.ok_or(CommandError::MissingArgument("user id"))?)
}

fn flag_name(raw: Option<&str>) -> std::result::Result<String, CommandError> {
    raw.map(str::to_string)
        .ok_or(CommandError::MissingArgument("flag name"))
}

/// Where a command was issued. `message_id` is the command message itself and
/// becomes the marker for flags it creates.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub prefix: &'a str,
}

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub reply: String,
    pub result: Option<PurgeResult>,
}

impl CommandOutcome {
    fn reply(reply: String) -> Self {
        Self {
            reply,
            result: None,
        }
    }

    fn purged(reply: String, result: PurgeResult) -> Self {
        let reply = match result.failures.len() {
            0 => reply,
            n => format!("{} ({} could not be deleted)", reply, n),
        };
        Self {
            reply,
            result: Some(result),
        }
    }
}

/// Run a parsed command. A missing flag becomes a reply rather than an error;
/// only history failures propagate.
pub async fn dispatch(
    engine: &PurgeEngine,
    invocation: Invocation<'_>,
    command: Command,
) -> Result<CommandOutcome> {
    let channel_id = invocation.channel_id;
    debug!("Dispatching {:?} in #{}", command, channel_id);

    let window = command.window_days();
    let outcome = match command {
        Command::Delete { author, count } => {
            let result = engine.run_ad_hoc_purge(channel_id, author, count, window).await?;
            let n = result.deleted;
            let reply = match (author, count) {
                (None, None) => format!("Deleted today's messages from all users ({}).", n),
                (None, Some(_)) => format!("Deleted {} messages from all users.", n),
                (Some(user), None) => format!("Deleted today's messages from <@{}> ({}).", user, n),
                (Some(user), Some(_)) => format!("Deleted {} messages from <@{}>.", n, user),
            };
            CommandOutcome::purged(reply, result)
        }
        Command::FlagCreate(name) => {
            engine.create_flag(channel_id, &name, invocation.message_id).await;
            CommandOutcome::reply(format!("Flag `{}` created.", name))
        }
        Command::FlagExecute(name) => match engine.execute_flag(channel_id, &name).await {
            Ok(result) => CommandOutcome::purged(
                format!("Deleted {} messages since flag `{}`.", result.deleted, name),
                result,
            ),
            Err(PurgeError::FlagNotFound { .. }) => CommandOutcome::reply("That flag does not exist.".into()),
            Err(e) => return Err(e),
        },
        Command::UserFlagCreate(user) => {
            engine.create_user_flag(channel_id, user, invocation.message_id).await;
            CommandOutcome::reply(format!("User flag created (target: <@{}>).", user))
        }
        Command::UserFlagExecute(user) => match engine.execute_user_flag(channel_id, user).await {
            Ok(result) => CommandOutcome::purged(
                format!("Deleted {} messages from <@{}> since their flag.", result.deleted, user),
                result,
            ),
            Err(PurgeError::FlagNotFound { .. }) => CommandOutcome::reply("That flag does not exist.".into()),
            Err(e) => return Err(e),
        },
        Command::Usage(topic) => CommandOutcome::reply(usage(invocation.prefix, topic)),
    };

    Ok(outcome)
}

pub fn usage(prefix: &str, topic: UsageTopic) -> String {
    match topic {
        UsageTopic::Flag => format!(
            "Usage: `{p}ffd create <flag>` / `{p}ffd execute <flag>`",
            p = prefix
        ),
        UsageTopic::UserFlag => format!(
            "Usage: `{p}ffdu create <user id>` / `{p}ffdu execute <user id>`",
            p = prefix
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::InMemoryCheckpointStore;
    use crate::clock::ManualClock;
    use crate::executor::PurgeConfig;
    use crate::testing::MemoryPlatform;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn parses_delete_variants() {
        assert_eq!(
            parse_command("?", "?dl all").unwrap(),
            Some(Command::Delete { author: None, count: None })
        );
        assert_eq!(
            parse_command("?", "?dl all 5").unwrap(),
            Some(Command::Delete { author: None, count: Some(5) })
        );
        assert_eq!(
            parse_command("?", "  ?dl 1234  ").unwrap(),
            Some(Command::Delete { author: Some(UserId(1234)), count: None })
        );
        assert_eq!(
            parse_command("?", "?dl 1234 3").unwrap(),
            Some(Command::Delete { author: Some(UserId(1234)), count: Some(3) })
        );
    }

    #[test]
    fn delete_windows_follow_target_and_count() {
        let window = |text: &str| parse_command("?", text).unwrap().unwrap().window_days();
        assert_eq!(window("?dl all"), Some(1));
        assert_eq!(window("?dl all 5"), Some(1));
        assert_eq!(window("?dl 42"), Some(1));
        assert_eq!(window("?dl 42 5"), Some(14));
    }

    #[test]
    fn rejects_bad_targets_and_counts() {
        assert_eq!(
            parse_command("?", "?dl bob"),
            Err(CommandError::InvalidTarget("bob".into()))
        );
        assert_eq!(
            parse_command("?", "?dl all many"),
            Err(CommandError::BadCount("many".into()))
        );
        assert_eq!(parse_command("?", "?dl"), Err(CommandError::MissingArgument("target")));
        assert_eq!(
            parse_command("?", "?ffdu create someone"),
            Err(CommandError::InvalidTarget("someone".into()))
        );
        assert_eq!(
            parse_command("?", "?ffd execute"),
            Err(CommandError::MissingArgument("flag name"))
        );
    }

    #[test]
    fn flag_commands_and_usage() {
        assert_eq!(
            parse_command("?", "?ffd create x").unwrap(),
            Some(Command::FlagCreate("x".into()))
        );
        assert_eq!(
            parse_command("?", "?ffdu execute 9").unwrap(),
            Some(Command::UserFlagExecute(UserId(9)))
        );
        assert_eq!(
            parse_command("?", "?ffd").unwrap(),
            Some(Command::Usage(UsageTopic::Flag))
        );
        assert_eq!(
            parse_command("?", "?ffdu list").unwrap(),
            Some(Command::Usage(UsageTopic::UserFlag))
        );
    }

    #[test]
    fn ignores_non_commands() {
        assert_eq!(parse_command("?", "hello there").unwrap(), None);
        assert_eq!(parse_command("?", "?").unwrap(), None);
        assert_eq!(parse_command("?", "?help").unwrap(), None);
        assert_eq!(parse_command("!", "?dl all").unwrap(), None);
    }

    #[tokio::test]
    async fn flag_round_trip_through_commands() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let platform = Arc::new(MemoryPlatform::new());
        let engine = PurgeEngine::new(
            platform.clone(),
            Arc::new(InMemoryCheckpointStore::new()),
            Arc::new(ManualClock::new(start)),
            PurgeConfig::default(),
        );
        let channel_id = ChannelId(3);

        let create_msg = platform.post(channel_id, UserId(1), start);
        let invocation = Invocation { channel_id, message_id: create_msg, prefix: "?" };
        let command = parse_command("?", "?ffd create x").unwrap().unwrap();
        let outcome = dispatch(&engine, invocation, command).await.unwrap();
        assert_eq!(outcome.reply, "Flag `x` created.");

        for i in 1..=3 {
            platform.post(channel_id, UserId(2), start + Duration::seconds(i));
        }

        let exec_msg = platform.post(channel_id, UserId(1), start + Duration::seconds(10));
        let invocation = Invocation { channel_id, message_id: exec_msg, prefix: "?" };
        let command = parse_command("?", "?ffd execute x").unwrap().unwrap();
        let outcome = dispatch(&engine, invocation, command.clone()).await.unwrap();
        // the execute command message itself is after the marker too
        assert_eq!(outcome.reply, "Deleted 4 messages since flag `x`.");
        assert_eq!(outcome.result.map(|r| r.deleted), Some(4));

        let outcome = dispatch(&engine, invocation, command).await.unwrap();
        assert_eq!(outcome.reply, "That flag does not exist.");
        assert!(outcome.result.is_none());
    }

    #[tokio::test]
    async fn usage_reply_uses_prefix() {
        let platform = Arc::new(MemoryPlatform::new());
        let engine = PurgeEngine::with_defaults(platform, PurgeConfig::default());
        let invocation = Invocation {
            channel_id: ChannelId(1),
            message_id: MessageId(1),
            prefix: "!",
        };

        let outcome = dispatch(&engine, invocation, Command::Usage(UsageTopic::Flag))
            .await
            .unwrap();
        assert_eq!(outcome.reply, "Usage: `!ffd create <flag>` / `!ffd execute <flag>`");
    }
}
