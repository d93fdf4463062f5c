// src/core/commands/string/incr.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::DataValue;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct Incr {
    pub key: Bytes,
}

impl ParseCommand for Incr {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 1, "INCR")?;
        Ok(Incr {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Incr {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let mut store = ctx.state.store.lock();
        let next = match store.get_mut(&self.key) {
            None => {
                store.set(self.key.clone(), DataValue::String(Bytes::from("1")), None);
                1
            }
            Some(entry) => {
                // An existing TTL survives the rewrite.
                let DataValue::String(current) = &entry.data else {
                    return Err(CitrineError::NotAnInteger);
                };
                let parsed: i64 = std::str::from_utf8(current)
                    .map_err(|_| CitrineError::NotAnInteger)?
                    .parse()
                    .map_err(|_| CitrineError::NotAnInteger)?;
                let next = parsed.checked_add(1).ok_or(CitrineError::NotAnInteger)?;
                entry.data = DataValue::String(Bytes::from(next.to_string()));
                next
            }
        };
        Ok((RespValue::Integer(next), WriteOutcome::Write))
    }
}

impl CommandSpec for Incr {
    fn name(&self) -> &'static str {
        "incr"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
}
