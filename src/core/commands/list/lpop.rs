// src/core/commands/list/lpop.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `LPOP key [count]`. Without a count a single bulk string is returned;
/// with one, an array of up to `count` elements.
#[derive(Debug, Clone, Default)]
pub struct LPop {
    pub key: Bytes,
    pub count: Option<usize>,
}

impl ParseCommand for LPop {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        match args.len() {
            1 => Ok(LPop {
                key: extract_bytes(&args[0])?,
                count: None,
            }),
            2 => Ok(LPop {
                key: extract_bytes(&args[0])?,
                count: Some(
                    extract_string(&args[1])?
                        .parse()
                        .map_err(|_| CitrineError::NotAnInteger)?,
                ),
            }),
            _ => Err(CitrineError::WrongArgumentCount("LPOP".to_string())),
        }
    }
}

#[async_trait]
impl ExecutableCommand for LPop {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let mut store = ctx.state.store.lock();
        let Some(list) = store.list_entry_opt(&self.key)? else {
            return Ok((RespValue::Null, WriteOutcome::DidNotWrite));
        };
        if list.is_empty() {
            return Ok((RespValue::Null, WriteOutcome::DidNotWrite));
        }
        let response = match self.count {
            None => RespValue::BulkString(
                list.pop_front()
                    .ok_or_else(|| CitrineError::Internal("empty list after check".into()))?,
            ),
            Some(count) => {
                let popped: Vec<RespValue> = (0..count)
                    .map_while(|_| list.pop_front())
                    .map(RespValue::BulkString)
                    .collect();
                RespValue::Array(popped)
            }
        };
        store.drop_if_empty(&self.key);
        Ok((response, WriteOutcome::Write))
    }
}

impl CommandSpec for LPop {
    fn name(&self) -> &'static str {
        "lpop"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone()];
        if let Some(count) = self.count {
            args.push(count.to_string().into());
        }
        args
    }
}
