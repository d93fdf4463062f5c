// src/core/commands/pubsub/psubscribe.rs

use crate::connection::SubscriptionReceiver;
use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `PSUBSCRIBE pattern`. Patterns support the `*` wildcard only.
#[derive(Debug, Clone, Default)]
pub struct PSubscribe {
    pub pattern: Bytes,
}

impl ParseCommand for PSubscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 1, "PSUBSCRIBE")?;
        Ok(PSubscribe {
            pattern: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for PSubscribe {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        if ctx.session.subscribed_patterns.insert(self.pattern.clone()) {
            let rx = ctx.state.pubsub.subscribe_pattern(&self.pattern);
            ctx.session
                .pubsub_receivers
                .push(SubscriptionReceiver::Pattern(self.pattern.clone(), rx));
        }
        Ok((
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from_static(b"psubscribe")),
                RespValue::BulkString(self.pattern.clone()),
                RespValue::Integer(ctx.session.subscription_count() as i64),
            ]),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for PSubscribe {
    fn name(&self) -> &'static str {
        "psubscribe"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::PUBSUB | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.pattern.clone()]
    }
}
