// src/core/commands/streams/xadd.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::RespFrame;
use crate::core::storage::stream::StreamIdSpec;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;

/// `XADD key id field value [field value ...]`.
#[derive(Debug, Clone)]
pub struct XAdd {
    pub key: Bytes,
    pub id: StreamIdSpec,
    /// The raw id token, re-emitted by `to_resp_args`.
    pub id_token: String,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl ParseCommand for XAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() < 4 || (args.len() - 2) % 2 != 0 {
            return Err(CitrineError::WrongArgumentCount("XADD".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let id_token = extract_string(&args[1])?;
        let id = StreamIdSpec::parse(&id_token)?;
        let fields = args[2..]
            .chunks_exact(2)
            .map(|chunk| -> Result<(Bytes, Bytes), CitrineError> {
                Ok((extract_bytes(&chunk[0])?, extract_bytes(&chunk[1])?))
            })
            .collect::<Result<_, _>>()?;
        Ok(XAdd {
            key,
            id,
            id_token,
            fields,
        })
    }
}

#[async_trait]
impl ExecutableCommand for XAdd {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let resolved_id = {
            let mut store = ctx.state.store.lock();
            let stream = store.stream_entry(&self.key)?;
            let fields: IndexMap<Bytes, Bytes> = self.fields.iter().cloned().collect();
            stream.append(self.id, fields)?
        };

        ctx.state.stream_blockers.notify(&self.key);

        // Replicas receive the resolved id, never `*`, so their streams stay
        // byte-identical to the master's.
        let mut propagated: Vec<Bytes> = vec![
            Bytes::from_static(b"XADD"),
            self.key.clone(),
            resolved_id.to_string().into(),
        ];
        for (field, value) in &self.fields {
            propagated.push(field.clone());
            propagated.push(value.clone());
        }
        ctx.propagation_override = Some(propagated);

        Ok((
            RespValue::BulkString(resolved_id.to_string().into()),
            WriteOutcome::Write,
        ))
    }
}

impl CommandSpec for XAdd {
    fn name(&self) -> &'static str {
        "xadd"
    }
    fn arity(&self) -> i64 {
        -5
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.key.clone(), self.id_token.clone().into()];
        for (field, value) in &self.fields {
            args.push(field.clone());
            args.push(value.clone());
        }
        args
    }
}
