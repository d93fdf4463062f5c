// src/core/commands/list/blpop.rs

//! `BLPOP key timeout_seconds`. A non-empty list answers immediately;
//! otherwise the client parks a waiter and is handed the head element by the
//! next push, or times out to a null reply. Timeout 0 blocks forever.

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct BLPop {
    pub key: Bytes,
    pub timeout: Option<Duration>,
}

impl ParseCommand for BLPop {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 2, "BLPOP")?;
        let key = extract_bytes(&args[0])?;
        let seconds: f64 = extract_string(&args[1])?
            .parse()
            .map_err(|_| CitrineError::NotAFloat)?;
        let timeout = (seconds > 0.0).then(|| Duration::from_secs_f64(seconds));
        Ok(BLPop { key, timeout })
    }
}

#[async_trait]
impl ExecutableCommand for BLPop {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        // Fast path and waiter registration happen under one store lock, so a
        // concurrent push cannot slip between the emptiness check and the
        // registration.
        let (waker, rx) = {
            let mut store = ctx.state.store.lock();
            if let Some(list) = store.list_entry_opt(&self.key)? {
                if let Some(value) = list.pop_front() {
                    store.drop_if_empty(&self.key);
                    return Ok((
                        RespValue::Array(vec![
                            RespValue::BulkString(self.key.clone()),
                            RespValue::BulkString(value),
                        ]),
                        WriteOutcome::Write,
                    ));
                }
            }
            ctx.state.list_blockers.register(&self.key, ctx.session_id)
        };

        let woken = ctx
            .state
            .list_blockers
            .wait(&self.key, &waker, rx, self.timeout)
            .await;

        match woken {
            Some(popped) => Ok((
                RespValue::Array(vec![
                    RespValue::BulkString(popped.key),
                    RespValue::BulkString(popped.value),
                ]),
                // The notifying push already accounted for the write.
                WriteOutcome::DidNotWrite,
            )),
            None => Ok((RespValue::Null, WriteOutcome::DidNotWrite)),
        }
    }
}

impl CommandSpec for BLPop {
    fn name(&self) -> &'static str {
        "blpop"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        // A popped head is not replayed to replicas.
        CommandFlags::WRITE | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let timeout = self
            .timeout
            .map_or_else(|| "0".to_string(), |d| d.as_secs_f64().to_string());
        vec![self.key.clone(), timeout.into()]
    }
}
