// src/core/commands/hash/hgetall.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `HGETALL key`: all fields and values, interleaved, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct HGetAll {
    pub key: Bytes,
}

impl ParseCommand for HGetAll {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 1, "HGETALL")?;
        Ok(HGetAll {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for HGetAll {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let mut store = ctx.state.store.lock();
        let mut flat = Vec::new();
        if let Some(hash) = store.hash_entry_opt(&self.key)? {
            flat.reserve(hash.len() * 2);
            for (field, value) in hash {
                flat.push(RespValue::BulkString(field.clone()));
                flat.push(RespValue::BulkString(value.clone()));
            }
        }
        Ok((RespValue::Array(flat), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for HGetAll {
    fn name(&self) -> &'static str {
        "hgetall"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
}
