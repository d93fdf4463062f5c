// src/core/commands/generic/wait.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_string, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `WAIT numreplicas timeout_ms`. Replies with the number of replicas that
/// acknowledged the outstanding writes within the timeout (0 = no deadline).
#[derive(Debug, Clone, Default)]
pub struct Wait {
    pub num_replicas: u64,
    pub timeout_ms: u64,
}

impl ParseCommand for Wait {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 2, "WAIT")?;
        Ok(Wait {
            num_replicas: extract_string(&args[0])?
                .parse()
                .map_err(|_| CitrineError::NotAnInteger)?,
            timeout_ms: extract_string(&args[1])?
                .parse()
                .map_err(|_| CitrineError::NotAnInteger)?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Wait {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let acked = ctx.state.replication.wait_for_acks(self.timeout_ms).await?;
        Ok((
            RespValue::Integer(acked as i64),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for Wait {
    fn name(&self) -> &'static str {
        "wait"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![
            self.num_replicas.to_string().into(),
            self.timeout_ms.to_string().into(),
        ]
    }
}
