// src/core/commands/streams/xread.rs

//! `XREAD [BLOCK ms] STREAMS key [key ...] id [id ...]`.
//!
//! The non-blocking form answers with the entries newer than each requested
//! id. The blocking form parks one waiter on every requested stream and,
//! when any of them is appended to, re-runs the whole query. An id of `$`
//! selects only entries appended strictly after the command was parsed.

use crate::core::commands::command_trait::{
    CommandFlags, CommandSpec, ExecutableCommand, ExecutionContext, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::commands::streams::xrange::entry_to_resp;
use crate::core::protocol::RespFrame;
use crate::core::storage::Store;
use crate::core::storage::stream::StreamId;
use crate::core::{CitrineError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, SystemTime};

/// Where a single stream query starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XReadStart {
    /// Entries with an id strictly greater than this one.
    From(StreamId),
    /// `$`: entries appended strictly after the parse-time snapshot.
    New,
}

#[derive(Debug, Clone)]
pub struct XRead {
    /// `None` = non-blocking; `Some(None)` = block without a deadline;
    /// `Some(Some(d))` = block for at most `d`.
    pub block: Option<Option<Duration>>,
    pub queries: Vec<(Bytes, XReadStart)>,
    /// The raw id tokens, re-emitted by `to_resp_args`.
    id_tokens: Vec<String>,
    /// The wall-clock snapshot `$` queries filter against.
    parsed_at: SystemTime,
}

impl ParseCommand for XRead {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.is_empty() {
            return Err(CitrineError::WrongArgumentCount("XREAD".to_string()));
        }

        let mut block = None;
        let mut idx = 0;
        if extract_string(&args[0])?.eq_ignore_ascii_case("block") {
            if args.len() < 2 {
                return Err(CitrineError::SyntaxError);
            }
            let ms: u64 = extract_string(&args[1])?
                .parse()
                .map_err(|_| CitrineError::NotAnInteger)?;
            block = Some((ms > 0).then(|| Duration::from_millis(ms)));
            idx = 2;
        }

        let streams_kw = args
            .get(idx)
            .ok_or_else(|| CitrineError::WrongArgumentCount("XREAD".to_string()))?;
        if !extract_string(streams_kw)?.eq_ignore_ascii_case("streams") {
            return Err(CitrineError::SyntaxError);
        }

        let rest = &args[idx + 1..];
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CitrineError::WrongArgumentCount("XREAD".to_string()));
        }
        let half = rest.len() / 2;

        let mut queries = Vec::with_capacity(half);
        let mut id_tokens = Vec::with_capacity(half);
        for i in 0..half {
            let key = extract_bytes(&rest[i])?;
            let token = extract_string(&rest[half + i])?;
            let start = if token == "$" {
                XReadStart::New
            } else {
                XReadStart::From(token.parse()?)
            };
            queries.push((key, start));
            id_tokens.push(token);
        }

        Ok(XRead {
            block,
            queries,
            id_tokens,
            parsed_at: SystemTime::now(),
        })
    }
}

impl XRead {
    /// Runs every per-stream query against the store.
    fn run_query(&self, store: &mut Store) -> Result<Vec<(Bytes, Vec<RespValue>)>, CitrineError> {
        self.queries
            .iter()
            .map(|(key, start)| {
                let entries = match store.stream_entry_opt(key)? {
                    None => Vec::new(),
                    Some(stream) => {
                        let matched = match start {
                            XReadStart::From(id) => stream.entries_after(*id),
                            XReadStart::New => stream.entries_newer_than(self.parsed_at),
                        };
                        matched.into_iter().map(entry_to_resp).collect()
                    }
                };
                Ok((key.clone(), entries))
            })
            .collect()
    }

    fn to_response(results: Vec<(Bytes, Vec<RespValue>)>) -> RespValue {
        RespValue::Array(
            results
                .into_iter()
                .map(|(key, entries)| {
                    RespValue::Array(vec![RespValue::BulkString(key), RespValue::Array(entries)])
                })
                .collect(),
        )
    }
}

#[async_trait]
impl ExecutableCommand for XRead {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), CitrineError> {
        let Some(wait_timeout) = self.block else {
            let mut store = ctx.state.store.lock();
            let results = self.run_query(&mut store)?;
            return Ok((Self::to_response(results), WriteOutcome::DidNotWrite));
        };

        let keys: Vec<Bytes> = self.queries.iter().map(|(key, _)| key.clone()).collect();

        // Initial check and waiter registration happen under one store lock,
        // so an XADD cannot slip in between.
        let (waker, rx) = {
            let mut store = ctx.state.store.lock();
            let results = self.run_query(&mut store)?;
            if results.iter().any(|(_, entries)| !entries.is_empty()) {
                return Ok((Self::to_response(results), WriteOutcome::DidNotWrite));
            }
            ctx.state.stream_blockers.register(&keys, ctx.session_id)
        };

        let woken = ctx
            .state
            .stream_blockers
            .wait(&keys, &waker, rx, wait_timeout)
            .await;
        if !woken {
            return Ok((RespValue::Null, WriteOutcome::DidNotWrite));
        }

        let mut store = ctx.state.store.lock();
        let results = self.run_query(&mut store)?;
        Ok((Self::to_response(results), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for XRead {
    fn name(&self) -> &'static str {
        "xread"
    }
    fn arity(&self) -> i64 {
        -4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args: Vec<Bytes> = Vec::new();
        if let Some(timeout) = self.block {
            args.push(Bytes::from_static(b"BLOCK"));
            let ms = timeout.map_or(0, |d| d.as_millis() as u64);
            args.push(ms.to_string().into());
        }
        args.push(Bytes::from_static(b"STREAMS"));
        for (key, _) in &self.queries {
            args.push(key.clone());
        }
        for token in &self.id_tokens {
            args.push(token.clone().into());
        }
        args
    }
}
