// src/core/commands/string/set.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{ArgParser, extract_bytes};
use crate::core::protocol::RespFrame;
use crate::core::storage::DataValue;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// The TTL options accepted by `SET`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TtlOption {
    #[default]
    None,
    Seconds(u64),
    Milliseconds(u64),
}

/// The `SET` command: `SET key value [PX ms | EX s]`.
#[derive(Debug, Clone, Default)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub ttl: TtlOption,
}

impl ParseCommand for Set {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() < 2 {
            return Err(CitrineError::WrongArgumentCount("SET".to_string()));
        }
        let mut cmd = Set {
            key: extract_bytes(&args[0])?,
            value: extract_bytes(&args[1])?,
            ..Default::default()
        };

        let mut parser = ArgParser::new(&args[2..]);
        if let Some(seconds) = parser.match_option("ex")? {
            cmd.ttl = TtlOption::Seconds(seconds);
        } else if let Some(ms) = parser.match_option("px")? {
            cmd.ttl = TtlOption::Milliseconds(ms);
        }
        if !parser.remaining_args().is_empty() {
            return Err(CitrineError::SyntaxError);
        }
        Ok(cmd)
    }
}

#[async_trait]
impl ExecutableCommand for Set {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let ttl_ms = match self.ttl {
            TtlOption::None => None,
            TtlOption::Seconds(s) => Some(s * 1_000),
            TtlOption::Milliseconds(ms) => Some(ms),
        };
        ctx.state.store.lock().set(
            self.key.clone(),
            DataValue::String(self.value.clone()),
            ttl_ms,
        );
        Ok((
            RespValue::SimpleString("OK".into()),
            WriteOutcome::Write,
        ))
    }
}

impl CommandSpec for Set {
    fn name(&self) -> &'static str {
        "set"
    }
    fn arity(&self) -> i64 {
        -3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone(), self.value.clone()];
        match self.ttl {
            TtlOption::Seconds(ttl) => {
                args.extend([Bytes::from_static(b"EX"), ttl.to_string().into()])
            }
            TtlOption::Milliseconds(ttl) => {
                args.extend([Bytes::from_static(b"PX"), ttl.to_string().into()])
            }
            TtlOption::None => {}
        }
        args
    }
}
