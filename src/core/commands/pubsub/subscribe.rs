// src/core/commands/pubsub/subscribe.rs

use crate::connection::SubscriptionReceiver;
use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `SUBSCRIBE channel`. Adds the channel to both the session's subscription
/// set and the process-wide registry, and replies with the confirmation
/// triple.
#[derive(Debug, Clone, Default)]
pub struct Subscribe {
    pub channel: Bytes,
}

impl ParseCommand for Subscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 1, "SUBSCRIBE")?;
        Ok(Subscribe {
            channel: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Subscribe {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        if ctx.session.subscribed_channels.insert(self.channel.clone()) {
            let rx = ctx.state.pubsub.subscribe(&self.channel);
            ctx.session
                .pubsub_receivers
                .push(SubscriptionReceiver::Channel(self.channel.clone(), rx));
        }
        Ok((
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from_static(b"subscribe")),
                RespValue::BulkString(self.channel.clone()),
                RespValue::Integer(ctx.session.subscription_count() as i64),
            ]),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for Subscribe {
    fn name(&self) -> &'static str {
        "subscribe"
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
