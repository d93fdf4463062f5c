// src/core/commands/streams/xrange.rs

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::stream::{StreamEntry, StreamId};
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `XRANGE key start end`: an inclusive id-range scan. `-` is the minimum id,
/// `+` the maximum; a bare millisecond bound covers its whole sequence range.
#[derive(Debug, Clone)]
pub struct XRange {
    pub key: Bytes,
    pub start: StreamId,
    pub end: StreamId,
}

/// Parses a range bound. `is_end` controls the default sequence for a bare
/// `<ms>` bound: 0 at the start of the range, max at the end.
fn parse_range_id(token: &str, is_end: bool) -> Result<StreamId, CitrineError> {
    match token {
        "-" => Ok(StreamId::ZERO),
        "+" => Ok(StreamId::MAX),
        _ => {
            if token.contains('-') {
                token.parse()
            } else {
                let ms = token.parse().map_err(|_| CitrineError::SyntaxError)?;
                Ok(StreamId::new(ms, if is_end { u64::MAX } else { 0 }))
            }
        }
    }
}

/// Renders one stream entry as `[id, [field, value, ...]]`.
pub(crate) fn entry_to_resp(entry: &StreamEntry) -> RespValue {
    let mut fields = Vec::with_capacity(entry.fields.len() * 2);
    for (field, value) in &entry.fields {
        fields.push(RespValue::BulkString(field.clone()));
        fields.push(RespValue::BulkString(value.clone()));
    }
    RespValue::Array(vec![
        RespValue::BulkString(entry.id.to_string().into()),
        RespValue::Array(fields),
    ])
}

impl ParseCommand for XRange {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 3, "XRANGE")?;
        Ok(XRange {
            key: extract_bytes(&args[0])?,
            start: parse_range_id(&extract_string(&args[1])?, false)?,
            end: parse_range_id(&extract_string(&args[2])?, true)?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for XRange {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let mut store = ctx.state.store.lock();
        let entries = match store.stream_entry_opt(&self.key)? {
            None => Vec::new(),
            Some(stream) => stream
                .range(self.start, self.end)
                .into_iter()
                .map(entry_to_resp)
                .collect(),
        };
        Ok((RespValue::Array(entries), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for XRange {
    fn name(&self) -> &'static str {
        "xrange"
    }
    fn arity(&self) -> i64 {
        4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![
            self.key.clone(),
            self.start.to_string().into(),
            self.end.to_string().into(),
        ]
    }
}
