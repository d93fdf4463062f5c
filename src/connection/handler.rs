// src/connection/handler.rs

//! Defines the `ConnectionHandler`, which manages the full lifecycle of a
//! client connection: the read→decode→dispatch→write loop, the transaction
//! state machine, the subscription-mode gate, Pub/Sub message delivery, and
//! the PSYNC promotion of a client socket into a replica channel.

use super::session::{SessionState, SubscriptionReceiver};
use crate::core::commands::{self, Command, ExecutionContext};
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::state::ServerState;
use crate::core::{CitrineError, RespValue};
use futures::{FutureExt, SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// The next step for the connection loop after a processed command.
enum NextAction {
    Continue,
    ExitLoop,
    ReplicaHandoff,
}

/// How the connection loop ended.
enum LoopExit {
    Disconnect,
    Handoff,
}

/// One event produced by the connection's select loop.
enum Event {
    Shutdown,
    PubSub(Result<RespFrame, broadcast::error::RecvError>),
    Socket(Option<Result<RespFrame, CitrineError>>),
}

/// Manages the full lifecycle of a client connection.
pub struct ConnectionHandler {
    framed: Framed<TcpStream, RespFrameCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    session_id: u64,
    session: SessionState,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    pub fn new(socket: TcpStream, addr: SocketAddr, state: Arc<ServerState>, session_id: u64) -> Self {
        let shutdown_rx = state.subscribe_shutdown();
        Self {
            framed: Framed::new(socket, RespFrameCodec),
            addr,
            state,
            session_id,
            session: SessionState::new(),
            shutdown_rx,
        }
    }

    /// Runs the connection to completion, then either cleans up the session
    /// or hands the socket off to the replica registry.
    pub async fn run(mut self) {
        match self.serve().await {
            Ok(LoopExit::Handoff) => {
                // The socket now belongs to the replication layer; the master
                // stops reading it as a client.
                self.state.transactions.remove(&self.session_id);
                let Self {
                    framed,
                    addr,
                    state,
                    session_id,
                    ..
                } = self;
                state
                    .replication
                    .add_replica(session_id, addr, framed.into_inner());
            }
            Ok(LoopExit::Disconnect) => {
                debug!("Connection from {} closed.", self.addr);
                self.state.cleanup_session(self.session_id);
            }
            Err(e) => {
                if is_normal_disconnect(&e) {
                    debug!("Connection from {} closed by peer: {}", self.addr, e);
                } else {
                    warn!("Connection error for {}: {}", self.addr, e);
                }
                self.state.cleanup_session(self.session_id);
            }
        }
    }

    /// The main event loop: socket frames, Pub/Sub deliveries, and shutdown.
    async fn serve(&mut self) -> Result<LoopExit, CitrineError> {
        loop {
            // The receivers are moved out for the duration of the select so
            // the Pub/Sub future and the command dispatch below cannot hold
            // conflicting borrows of the session.
            let mut receivers = std::mem::take(&mut self.session.pubsub_receivers);
            let event = tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => Event::Shutdown,
                msg = next_pubsub_message(&mut receivers), if !receivers.is_empty() => Event::PubSub(msg),
                result = self.framed.next() => Event::Socket(result),
            };
            receivers.append(&mut self.session.pubsub_receivers);
            self.session.pubsub_receivers = receivers;

            match event {
                Event::Shutdown => {
                    info!("Connection handler for {} received shutdown signal.", self.addr);
                    return Ok(LoopExit::Disconnect);
                }
                Event::PubSub(Ok(frame)) => {
                    self.respond(vec![frame]).await?;
                }
                Event::PubSub(Err(broadcast::error::RecvError::Lagged(missed))) => {
                    // The receiver fell behind and dropped messages; a fresh
                    // subscription resumes delivery from now on.
                    warn!(
                        "Pub/Sub receiver for {} lagged, missed {} messages; re-subscribing.",
                        self.addr, missed
                    );
                    self.resubscribe_all();
                }
                Event::PubSub(Err(broadcast::error::RecvError::Closed)) => {
                    self.resubscribe_all();
                }
                Event::Socket(None) => return Ok(LoopExit::Disconnect),
                // A codec-level parse error is not recoverable: the stream
                // framing is gone, so the connection closes.
                Event::Socket(Some(Err(e))) => return Err(e),
                Event::Socket(Some(Ok(frame))) => match self.process_frame(frame).await {
                    Ok(NextAction::Continue) => {}
                    Ok(NextAction::ExitLoop) => return Ok(LoopExit::Disconnect),
                    Ok(NextAction::ReplicaHandoff) => return Ok(LoopExit::Handoff),
                    Err(e) => {
                        debug!("Session {}: replying error: {}", self.session_id, e);
                        self.respond(vec![RespFrame::Error(e.to_string())]).await?;
                    }
                },
            }
        }
    }

    /// Parses a frame into a command, runs it through the subscription and
    /// transaction gates, executes it, and writes the reply.
    async fn process_frame(&mut self, frame: RespFrame) -> Result<NextAction, CitrineError> {
        let command = Command::try_from(frame)?;
        debug!(
            "Session {}: received command '{}'",
            self.session_id,
            command.name()
        );

        if self.session.subscription_count() > 0 && !command.is_allowed_in_subscribe_mode() {
            return Err(CitrineError::SubscribeModeRestricted(
                command.name().to_string(),
            ));
        }

        // PSYNC switches the connection's protocol; it never goes through the
        // normal dispatch path.
        if matches!(command, Command::Psync(_)) {
            return self.handle_psync().await;
        }

        match &command {
            Command::Multi(_) => {
                // MULTI inside MULTI resets the queue.
                self.state.transactions.insert(self.session_id, Vec::new());
                self.respond_value(RespValue::SimpleString("OK".into()))
                    .await?;
                return Ok(NextAction::Continue);
            }
            Command::Exec(_) => return self.handle_exec().await,
            Command::Discard(_) => {
                if self.state.transactions.remove(&self.session_id).is_none() {
                    return Err(CitrineError::DiscardWithoutMulti);
                }
                self.respond_value(RespValue::SimpleString("OK".into()))
                    .await?;
                return Ok(NextAction::Continue);
            }
            _ => {}
        }

        // Inside MULTI every other command is queued, not executed.
        let mut queue_guard = self.state.transactions.get_mut(&self.session_id);
        if let Some(queue) = queue_guard.as_mut() {
            queue.push(command);
            drop(queue_guard);
            self.respond_value(RespValue::SimpleString("QUEUED".into()))
                .await?;
            return Ok(NextAction::Continue);
        }
        drop(queue_guard);

        let exit_after_reply = matches!(command, Command::Quit(_));
        let value = self.execute_command(&command).await?;
        self.respond_value(value).await?;
        if exit_after_reply {
            return Ok(NextAction::ExitLoop);
        }
        Ok(NextAction::Continue)
    }

    /// EXEC: drains the queue and executes each command in submission order
    /// with this connection's context. A failing command contributes an error
    /// frame to the composite reply instead of aborting the batch.
    async fn handle_exec(&mut self) -> Result<NextAction, CitrineError> {
        let Some((_, queued)) = self.state.transactions.remove(&self.session_id) else {
            return Err(CitrineError::ExecWithoutMulti);
        };
        let mut replies = Vec::with_capacity(queued.len());
        for command in &queued {
            let reply = match self.execute_command(command).await {
                Ok(value) => value,
                Err(e) => RespValue::Error(e.to_string()),
            };
            replies.push(reply);
        }
        self.respond_value(RespValue::Array(replies)).await?;
        Ok(NextAction::Continue)
    }

    /// PSYNC: reply `+FULLRESYNC <replid> 0`, stream the snapshot inline, and
    /// promote the connection.
    async fn handle_psync(&mut self) -> Result<NextAction, CitrineError> {
        let replid = self.state.replication.master_replid.clone();
        let snapshot = self.state.replication.snapshot_bytes();
        info!("Replica at {} requested full resynchronization.", self.addr);
        self.respond(vec![
            RespFrame::SimpleString(format!("FULLRESYNC {replid} 0")),
            RespFrame::RawBytes(snapshot),
        ])
        .await?;
        Ok(NextAction::ReplicaHandoff)
    }

    async fn execute_command(&mut self, command: &Command) -> Result<RespValue, CitrineError> {
        let mut ctx = ExecutionContext {
            state: self.state.clone(),
            session_id: self.session_id,
            session: &mut self.session,
            is_replicated: false,
            propagation_override: None,
        };
        commands::execute_and_propagate(command, &mut ctx).await
    }

    /// Writes a command's frames as a single contiguous write: every frame is
    /// buffered, then the socket is flushed once.
    async fn respond(&mut self, frames: Vec<RespFrame>) -> Result<(), CitrineError> {
        for frame in frames {
            self.framed.feed(frame).await?;
        }
        self.framed.flush().await?;
        Ok(())
    }

    async fn respond_value(&mut self, value: RespValue) -> Result<(), CitrineError> {
        self.respond(vec![value.into()]).await
    }

    /// Replaces every receiver with a fresh subscription after a lag.
    fn resubscribe_all(&mut self) {
        let old_receivers = std::mem::take(&mut self.session.pubsub_receivers);
        for receiver in old_receivers {
            match receiver {
                SubscriptionReceiver::Channel(name, _) => {
                    let rx = self.state.pubsub.subscribe(&name);
                    self.session
                        .pubsub_receivers
                        .push(SubscriptionReceiver::Channel(name, rx));
                }
                SubscriptionReceiver::Pattern(pattern, _) => {
                    let rx = self.state.pubsub.subscribe_pattern(&pattern);
                    self.session
                        .pubsub_receivers
                        .push(SubscriptionReceiver::Pattern(pattern, rx));
                }
            }
        }
    }
}

/// Waits for a message from any of the session's subscription receivers and
/// renders it as the pushed array frame the client expects.
async fn next_pubsub_message(
    receivers: &mut [SubscriptionReceiver],
) -> Result<RespFrame, broadcast::error::RecvError> {
    let select_all = futures::future::select_all(receivers.iter_mut().map(|sub| {
        async move {
            match sub {
                SubscriptionReceiver::Channel(name, rx) => rx.recv().await.map(|msg| {
                    RespValue::Array(vec![
                        RespValue::BulkString("message".into()),
                        RespValue::BulkString(name.clone()),
                        RespValue::BulkString(msg),
                    ])
                }),
                SubscriptionReceiver::Pattern(pattern, rx) => {
                    rx.recv().await.map(|(_, channel, msg)| {
                        RespValue::Array(vec![
                            RespValue::BulkString("pmessage".into()),
                            RespValue::BulkString(pattern.clone()),
                            RespValue::BulkString(channel),
                            RespValue::BulkString(msg),
                        ])
                    })
                }
            }
        }
        .boxed()
    }));
    let (result, _index, _remaining) = select_all.await;
    result.map(Into::into)
}

/// Helper to distinguish ordinary peer disconnects from real errors.
fn is_normal_disconnect(e: &CitrineError) -> bool {
    matches!(e, CitrineError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
