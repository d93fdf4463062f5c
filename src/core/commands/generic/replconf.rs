// src/core/commands/generic/replconf.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::Ordering;

/// `REPLCONF` accepts handshake configuration (`listening-port`, `capa`) with
/// a flat `+OK`, and answers `GETACK *` with `REPLCONF ACK <offset>`.
#[derive(Debug, Clone, Default)]
pub struct Replconf {
    pub args: Vec<String>,
}

impl Replconf {
    pub fn is_getack(&self) -> bool {
        self.args
            .first()
            .is_some_and(|arg| arg.eq_ignore_ascii_case("getack"))
    }
}

impl ParseCommand for Replconf {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.is_empty() {
            return Err(CitrineError::WrongArgumentCount("REPLCONF".to_string()));
        }
        let str_args = args
            .iter()
            .map(extract_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Replconf { args: str_args })
    }
}

#[async_trait]
impl ExecutableCommand for Replconf {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        if self.is_getack() {
            let offset = ctx.state.replication.replica_offset.load(Ordering::SeqCst);
            return Ok((
                RespValue::Array(vec![
                    RespValue::BulkString(Bytes::from_static(b"REPLCONF")),
                    RespValue::BulkString(Bytes::from_static(b"ACK")),
                    RespValue::BulkString(offset.to_string().into()),
                ]),
                WriteOutcome::DidNotWrite,
            ));
        }
        Ok((
            RespValue::SimpleString("OK".into()),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for Replconf {
    fn name(&self) -> &'static str {
        "replconf"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN | CommandFlags::NO_PROPAGATE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        self.args.iter().map(|s| s.clone().into()).collect()
    }
}
