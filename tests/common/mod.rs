// tests/common/mod.rs

//! Shared helpers for the test suites.

#![allow(dead_code)]

use bytes::Bytes;
use citrinedb::config::Config;
use citrinedb::connection::SessionState;
use citrinedb::core::commands::{Command, ExecutionContext, execute_and_propagate};
use citrinedb::core::state::ServerState;
use citrinedb::core::{CitrineError, RespFrame, RespValue};
use std::sync::Arc;

/// A command execution harness over a fresh (or shared) `ServerState`.
pub struct TestContext {
    pub state: Arc<ServerState>,
    pub session: SessionState,
    pub session_id: u64,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_state(ServerState::new(config))
    }

    /// A second context over the same state, as another connection would be.
    pub fn with_state(state: Arc<ServerState>) -> Self {
        let session_id = state.next_session_id();
        Self {
            state,
            session: SessionState::new(),
            session_id,
        }
    }

    /// Parses and executes one command the way the connection handler would.
    pub async fn run(&mut self, parts: &[&str]) -> Result<RespValue, CitrineError> {
        let frame = RespFrame::from_argv(parts.iter().map(|s| Bytes::from(s.to_string())));
        let command = Command::try_from(frame)?;
        let mut ctx = ExecutionContext {
            state: self.state.clone(),
            session_id: self.session_id,
            session: &mut self.session,
            is_replicated: false,
            propagation_override: None,
        };
        execute_and_propagate(&command, &mut ctx).await
    }
}

/// Builds a bulk-string argv slice for parse tests.
pub fn frame_args(parts: &[&str]) -> Vec<RespFrame> {
    parts
        .iter()
        .map(|s| RespFrame::BulkString(Bytes::from(s.to_string())))
        .collect()
}

pub fn bulk(s: &str) -> RespValue {
    RespValue::BulkString(Bytes::from(s.to_string()))
}

pub fn simple(s: &str) -> RespValue {
    RespValue::SimpleString(s.to_string())
}
