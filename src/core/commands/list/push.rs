// src/core/commands/list/push.rs

//! `LPUSH` and `RPUSH`. After pushing, any clients blocked on the key are
//! handed elements directly off the list, FIFO, before the store lock is
//! released.

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::parse_key_and_values;
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushSide {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct LPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
}

#[derive(Debug, Clone)]
pub struct RPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
}

impl ParseCommand for LPush {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        let (key, values) = parse_key_and_values(args, 2, "LPUSH")?;
        Ok(LPush { key, values })
    }
}

impl ParseCommand for RPush {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        let (key, values) = parse_key_and_values(args, 2, "RPUSH")?;
        Ok(RPush { key, values })
    }
}

/// Shared push logic. The reply is the list length after the push and before
/// any waiter handoff, so a value consumed by a blocked client still counts.
fn push_logic(
    ctx: &mut ExecutionContext<'_>,
    key: &Bytes,
    values: &[Bytes],
    side: PushSide,
) -> Result<(RespValue, WriteOutcome), CitrineError> {
    let mut store = ctx.state.store.lock();
    let list = store.list_entry(key)?;
    for value in values {
        match side {
            PushSide::Left => list.push_front(value.clone()),
            PushSide::Right => list.push_back(value.clone()),
        }
    }
    let len = list.len() as i64;
    let handed_off = ctx.state.list_blockers.notify_consume(key, list);
    if handed_off > 0 {
        store.drop_if_empty(key);
    }
    Ok((RespValue::Integer(len), WriteOutcome::Write))
}

#[async_trait]
impl ExecutableCommand for LPush {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        push_logic(ctx, &self.key, &self.values, PushSide::Left)
    }
}

#[async_trait]
impl ExecutableCommand for RPush {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        push_logic(ctx, &self.key, &self.values, PushSide::Right)
    }
}

impl CommandSpec for LPush {
    fn name(&self) -> &'static str {
        "lpush"
    }
    fn arity(&self) -> i64 {
        -3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone()];
        args.extend(self.values.iter().cloned());
        args
    }
}

impl CommandSpec for RPush {
    fn name(&self) -> &'static str {
        "rpush"
    }
    fn arity(&self) -> i64 {
        -3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone()];
        args.extend(self.values.iter().cloned());
        args
    }
}
