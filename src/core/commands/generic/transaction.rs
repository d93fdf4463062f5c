// src/core/commands/generic/transaction.rs

//! `MULTI`, `EXEC`, and `DISCARD`. The transaction state machine lives in the
//! connection handler, which never executes these three directly.

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::protocol::RespFrame;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

macro_rules! transaction_marker {
    ($struct_name:ident, $wire_name:literal, $name:literal) => {
        #[derive(Debug, Clone, Default)]
        pub struct $struct_name;

        impl ParseCommand for $struct_name {
            fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
                if !args.is_empty() {
                    return Err(CitrineError::WrongArgumentCount($wire_name.to_string()));
                }
                Ok($struct_name)
            }
        }

        #[async_trait]
        impl ExecutableCommand for $struct_name {
            async fn execute<'a>(
                &self,
                _ctx: &mut ExecutionContext<'a>,
            ) -> Result<(RespValue, WriteOutcome), CitrineError> {
                Err(CitrineError::Internal(concat!(
                    $wire_name,
                    " is handled by the connection handler"
                )
                .into()))
            }
        }

        impl CommandSpec for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }
            fn arity(&self) -> i64 {
                1
            }
            fn flags(&self) -> CommandFlags {
                CommandFlags::TRANSACTION | CommandFlags::NO_PROPAGATE
            }
            fn to_resp_args(&self) -> Vec<Bytes> {
                vec![]
            }
        }
    };
}

transaction_marker!(Multi, "MULTI", "multi");
transaction_marker!(Exec, "EXEC", "exec");
transaction_marker!(Discard, "DISCARD", "discard");
