// src/core/commands/pubsub/unsubscribe.rs

use crate::connection::SubscriptionReceiver;
use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `UNSUBSCRIBE channel`. Removes the channel from the session's set and
/// drops its receiver, which detaches it from the registry.
#[derive(Debug, Clone, Default)]
pub struct Unsubscribe {
    pub channel: Bytes,
}

impl ParseCommand for Unsubscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 1, "UNSUBSCRIBE")?;
        Ok(Unsubscribe {
            channel: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Unsubscribe {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        if ctx.session.subscribed_channels.remove(&self.channel) {
            ctx.session.pubsub_receivers.retain(|receiver| {
                !matches!(receiver, SubscriptionReceiver::Channel(name, _) if *name == self.channel)
            });
            ctx.state.pubsub.purge_empty_channels();
        }
        Ok((
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from_static(b"unsubscribe")),
                RespValue::BulkString(self.channel.clone()),
                RespValue::Integer(ctx.session.subscription_count() as i64),
            ]),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for Unsubscribe {
    fn name(&self) -> &'static str {
        "unsubscribe"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::PUBSUB | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.channel.clone()]
    }
}
