// src/core/commands/generic/command_info.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `COMMAND [DOCS ...]`: accepted for client-library handshakes, answered with
/// an empty array.
#[derive(Debug, Clone, Default)]
pub struct CommandInfo;

impl ParseCommand for CommandInfo {
    fn parse(_args: &[RespFrame]) -> Result<Self, CitrineError> {
        Ok(CommandInfo)
    }
}

#[async_trait]
impl ExecutableCommand for CommandInfo {
    async fn execute<'a>(
        &self,
        _ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        Ok((RespValue::Array(vec![]), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for CommandInfo {
    fn name(&self) -> &'static str {
        "command"
    }
    fn arity(&self) -> i64 {
        -1
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![]
    }
}
