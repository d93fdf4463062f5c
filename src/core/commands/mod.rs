// src/core/commands/mod.rs

//! This module defines all supported commands and the central `Command` enum
//! that encapsulates their parsed state. The `define_commands!` macro
//! generates the enum and its delegating implementations; dispatch is a plain
//! `match`, and the name table below is the only place a command name maps to
//! its parser.

use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use bytes::Bytes;
use tracing::warn;

pub mod command_trait;
pub mod generic;
pub mod hash;
pub mod helpers;
pub mod list;
pub mod pubsub;
pub mod streams;
pub mod string;
pub mod zset;

pub use command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};

macro_rules! define_commands {
    ( $( ($variant:ident, $struct_path:ty, $wire_name:literal) ),+ $(,)? ) => {
        /// A fully parsed command, one variant per supported command.
        #[derive(Debug, Clone)]
        pub enum Command {
            $( $variant($struct_path), )+
        }

        impl Command {
            pub fn name(&self) -> &'static str {
                match self {
                    $( Command::$variant(cmd) => cmd.name(), )+
                }
            }

            pub fn flags(&self) -> CommandFlags {
                match self {
                    $( Command::$variant(cmd) => cmd.flags(), )+
                }
            }

            pub fn to_resp_args(&self) -> Vec<Bytes> {
                match self {
                    $( Command::$variant(cmd) => cmd.to_resp_args(), )+
                }
            }

            pub async fn execute<'a>(
                &self,
                ctx: &mut ExecutionContext<'a>,
            ) -> Result<(RespValue, WriteOutcome), CitrineError> {
                match self {
                    $( Command::$variant(cmd) => cmd.execute(ctx).await, )+
                }
            }

            fn parse_by_name(name: &str, args: &[RespFrame]) -> Result<Command, CitrineError> {
                match name {
                    $( $wire_name => Ok(Command::$variant(<$struct_path>::parse(args)?)), )+
                    _ => Err(CitrineError::UnknownCommand(name.to_ascii_lowercase())),
                }
            }
        }
    };
}

define_commands! {
    // --- Generic ---
    (Ping, generic::Ping, "PING"),
    (Echo, generic::Echo, "ECHO"),
    (Type, generic::TypeInfo, "TYPE"),
    (Keys, generic::Keys, "KEYS"),
    (Config, generic::ConfigGet, "CONFIG"),
    (Info, generic::Info, "INFO"),
    (Replconf, generic::Replconf, "REPLCONF"),
    (Psync, generic::Psync, "PSYNC"),
    (Wait, generic::Wait, "WAIT"),
    (Multi, generic::Multi, "MULTI"),
    (Exec, generic::Exec, "EXEC"),
    (Discard, generic::Discard, "DISCARD"),
    (CommandInfo, generic::CommandInfo, "COMMAND"),
    (Quit, generic::Quit, "QUIT"),

    // --- Strings ---
    (Get, string::Get, "GET"),
    (Set, string::Set, "SET"),
    (Incr, string::Incr, "INCR"),

    // --- Lists ---
    (LPush, list::LPush, "LPUSH"),
    (RPush, list::RPush, "RPUSH"),
    (LPop, list::LPop, "LPOP"),
    (LLen, list::LLen, "LLEN"),
    (LRange, list::LRange, "LRANGE"),
    (BLPop, list::BLPop, "BLPOP"),

    // --- Hashes ---
    (HSet, hash::HSet, "HSET"),
    (HGet, hash::HGet, "HGET"),
    (HGetAll, hash::HGetAll, "HGETALL"),

    // --- Sorted sets ---
    (Zadd, zset::Zadd, "ZADD"),

    // --- Streams ---
    (XAdd, streams::XAdd, "XADD"),
    (XRange, streams::XRange, "XRANGE"),
    (XRead, streams::XRead, "XREAD"),

    // --- Pub/Sub ---
    (Subscribe, pubsub::Subscribe, "SUBSCRIBE"),
    (Unsubscribe, pubsub::Unsubscribe, "UNSUBSCRIBE"),
    (PSubscribe, pubsub::PSubscribe, "PSUBSCRIBE"),
    (PUnsubscribe, pubsub::PUnsubscribe, "PUNSUBSCRIBE"),
    (Publish, pubsub::Publish, "PUBLISH"),
}

impl Command {
    /// The full wire argv: the uppercased command name followed by its
    /// arguments. Used for replica fan-out.
    pub fn to_argv(&self) -> Vec<Bytes> {
        let mut argv = vec![Bytes::from(self.name().to_ascii_uppercase())];
        argv.extend(self.to_resp_args());
        argv
    }

    /// Whether the command passes the subscription-mode gate.
    pub fn is_allowed_in_subscribe_mode(&self) -> bool {
        matches!(
            self,
            Command::Subscribe(_)
                | Command::Unsubscribe(_)
                | Command::PSubscribe(_)
                | Command::PUnsubscribe(_)
                | Command::Ping(_)
                | Command::Quit(_)
        )
    }
}

impl TryFrom<RespFrame> for Command {
    type Error = CitrineError;

    /// Parses a wire frame (an array of bulk strings) into a typed command.
    fn try_from(frame: RespFrame) -> Result<Self, Self::Error> {
        let RespFrame::Array(parts) = frame else {
            return Err(CitrineError::SyntaxError);
        };
        let Some((name_frame, args)) = parts.split_first() else {
            return Err(CitrineError::SyntaxError);
        };
        let RespFrame::BulkString(name_bytes) = name_frame else {
            return Err(CitrineError::SyntaxError);
        };
        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| CitrineError::SyntaxError)?
            .to_ascii_uppercase();
        Command::parse_by_name(&name, args)
    }
}

/// Executes a command and, when it performed a write on a master, fans the
/// argv out to all connected replicas. A command may override the propagated
/// argv (XADD substitutes its resolved id); otherwise the original argv is
/// re-encoded. Fan-out failures are logged and never fail the client reply.
pub async fn execute_and_propagate(
    command: &Command,
    ctx: &mut ExecutionContext<'_>,
) -> Result<RespValue, CitrineError> {
    let (value, outcome) = command.execute(ctx).await?;

    let flags = command.flags();
    if outcome == WriteOutcome::Write
        && !ctx.is_replicated
        && ctx.state.replication.is_master()
        && flags.contains(CommandFlags::WRITE)
        && !flags.contains(CommandFlags::NO_PROPAGATE)
    {
        let argv = ctx
            .propagation_override
            .take()
            .unwrap_or_else(|| command.to_argv());
        if let Err(e) = ctx.state.replication.propagate(&argv).await {
            warn!("Replica fan-out for '{}' failed: {}", command.name(), e);
        }
    }

    Ok(value)
}
