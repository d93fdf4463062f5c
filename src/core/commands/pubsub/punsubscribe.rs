// src/core/commands/pubsub/punsubscribe.rs

use crate::connection::SubscriptionReceiver;
use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct PUnsubscribe {
    pub pattern: Bytes,
}

impl ParseCommand for PUnsubscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 1, "PUNSUBSCRIBE")?;
        Ok(PUnsubscribe {
            pattern: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for PUnsubscribe {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        if ctx.session.subscribed_patterns.remove(&self.pattern) {
            ctx.session.pubsub_receivers.retain(|receiver| {
                !matches!(receiver, SubscriptionReceiver::Pattern(name, _) if *name == self.pattern)
            });
            ctx.state.pubsub.purge_empty_channels();
        }
        Ok((
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from_static(b"punsubscribe")),
                RespValue::BulkString(self.pattern.clone()),
                RespValue::Integer(ctx.session.subscription_count() as i64),
            ]),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for PUnsubscribe {
    fn name(&self) -> &'static str {
        "punsubscribe"
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
