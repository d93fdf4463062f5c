// src/core/commands/zset/zadd.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `ZADD key score member`. Replies 1 when the member is new, 0 when only its
/// score was updated.
#[derive(Debug, Clone, Default)]
pub struct Zadd {
    pub key: Bytes,
    pub score: f64,
    pub member: Bytes,
}

impl ParseCommand for Zadd {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 3, "ZADD")?;
        Ok(Zadd {
            key: extract_bytes(&args[0])?,
            score: extract_string(&args[1])?
                .parse()
                .map_err(|_| CitrineError::NotAFloat)?,
            member: extract_bytes(&args[2])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Zadd {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let added = ctx
            .state
            .store
            .lock()
            .add_to_sorted_set(&self.key, self.score, self.member.clone())?;
        Ok((RespValue::Integer(i64::from(added)), WriteOutcome::Write))
    }
}

impl CommandSpec for Zadd {
    fn name(&self) -> &'static str {
        "zadd"
    }
    fn arity(&self) -> i64 {
        4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![
            self.key.clone(),
            self.score.to_string().into(),
            self.member.clone(),
        ]
    }
}
