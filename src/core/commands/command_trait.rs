// src/core/commands/command_trait.rs

//! Defines the core traits implemented by every executable command.

use crate::connection::SessionState;
use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bitflags::bitflags;
use bytes::Bytes;
use std::sync::Arc;

bitflags! {
    /// Flags that describe the properties and behavior of a command, used by
    /// the connection handler and the replication layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CommandFlags: u32 {
        /// The command modifies the dataset.
        const WRITE          = 1 << 0;
        /// The command only reads data.
        const READONLY       = 1 << 1;
        /// An administrative command.
        const ADMIN          = 1 << 2;
        /// A command related to the Pub/Sub system.
        const PUBSUB         = 1 << 3;
        /// The command must not be propagated to replicas.
        const NO_PROPAGATE   = 1 << 4;
        /// A command related to transactions (`MULTI`, `EXEC`, `DISCARD`).
        const TRANSACTION    = 1 << 5;
    }
}

/// Whether a command's execution actually modified the dataset. Propagation
/// to replicas only happens for commands that report a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    DidNotWrite,
    Write,
}

/// The state a command executes against. Constructed per dispatched command by
/// the connection handler (or the replication worker for the master's stream).
pub struct ExecutionContext<'a> {
    pub state: Arc<ServerState>,
    pub session_id: u64,
    pub session: &'a mut SessionState,
    /// True when the command arrived over the replication stream and must be
    /// applied silently.
    pub is_replicated: bool,
    /// A command may substitute the argv that is fanned out to replicas
    /// (e.g. XADD propagates its resolved id instead of `*`).
    pub propagation_override: Option<Vec<Bytes>>,
}

/// Constructs a command from its argv of frames.
pub trait ParseCommand: Sized {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError>;
}

/// The execution logic of a command, implemented by each command's struct.
#[async_trait]
pub trait ExecutableCommand {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError>;
}

/// Static metadata about a command.
pub trait CommandSpec {
    fn name(&self) -> &'static str;
    /// Arity counted Redis-style: positive = exact (including the command
    /// name), negative = minimum.
    fn arity(&self) -> i64;
    fn flags(&self) -> CommandFlags;
    /// The command's arguments, re-encodable for replica fan-out.
    fn to_resp_args(&self) -> Vec<Bytes>;
}
