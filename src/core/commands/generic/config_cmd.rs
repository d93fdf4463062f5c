// src/core/commands/generic/config_cmd.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `CONFIG GET param [param ...]`. Replies with an interleaved
/// `[name, value, ...]` array for the known parameters (`dir`, `dbfilename`).
#[derive(Debug, Clone, Default)]
pub struct ConfigGet {
    pub params: Vec<String>,
}

impl ParseCommand for ConfigGet {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() < 2 {
            return Err(CitrineError::WrongArgumentCount("CONFIG".to_string()));
        }
        if !extract_string(&args[0])?.eq_ignore_ascii_case("get") {
            return Err(CitrineError::SyntaxError);
        }
        let params = args[1..]
            .iter()
            .map(|arg| Ok(extract_string(arg)?.to_ascii_lowercase()))
            .collect::<Result<_, CitrineError>>()?;
        Ok(ConfigGet { params })
    }
}

#[async_trait]
impl ExecutableCommand for ConfigGet {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let config = &ctx.state.config;
        let mut entries = Vec::new();
        for param in &self.params {
            let value = match param.as_str() {
                "dir" => config.dir.clone(),
                "dbfilename" => config.dbfilename.clone(),
                _ => continue,
            };
            entries.push(RespValue::BulkString(param.clone().into()));
            entries.push(RespValue::BulkString(value.unwrap_or_default().into()));
        }
        Ok((RespValue::Array(entries), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for ConfigGet {
    fn name(&self) -> &'static str {
        "config"
    }
    fn arity(&self) -> i64 {
        -3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![Bytes::from_static(b"GET")];
        args.extend(self.params.iter().map(|p| Bytes::from(p.clone())));
        args
    }
}
