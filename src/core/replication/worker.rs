// src/core/replication/worker.rs

//! Implements the replication logic for a replica server.
//!
//! The worker owns the replica's connection to its master: it performs the
//! four-step handshake, ingests the inline snapshot, then applies the
//! continuous command stream silently while accounting the replication offset.
//! Only `REPLCONF GETACK` produces an outbound reply, and its ACK reports the
//! offset *before* the GETACK frame itself is counted. The worker reconnects
//! with capped exponential backoff if the master drops.

use crate::connection::SessionState;
use crate::core::commands::{Command, ExecutionContext};
use crate::core::protocol::{RespFrame, parse_frame};
use crate::core::state::ServerState;
use crate::core::storage::snapshot;
use crate::core::{CitrineError, replication::ReplicationRole};
use bytes::{Buf, Bytes, BytesMut};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

// The initial delay before the first reconnection attempt.
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
// The maximum delay for the exponential backoff reconnection strategy.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// The session id reserved for the master link. Never allocated to clients.
const MASTER_LINK_SESSION_ID: u64 = 0;

/// The background task that keeps a replica synchronized with its master.
pub struct ReplicaWorker {
    state: Arc<ServerState>,
}

impl ReplicaWorker {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// The main run loop: connect, sync, and reconnect on failure.
    pub async fn run(self) {
        let ReplicationRole::Replica {
            master_host,
            master_port,
        } = self.state.replication.role.clone()
        else {
            return;
        };

        let mut delay = INITIAL_RECONNECT_DELAY;
        loop {
            match self.connect_and_sync(&master_host, master_port).await {
                Ok(()) => {
                    delay = INITIAL_RECONNECT_DELAY;
                }
                Err(e) => {
                    warn!(
                        "Replication link to {}:{} failed: {}. Reconnecting in {:?}.",
                        master_host, master_port, e, delay
                    );
                }
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_RECONNECT_DELAY);
        }
    }

    /// One full session against the master: handshake, snapshot, stream.
    async fn connect_and_sync(&self, host: &str, port: u16) -> Result<(), CitrineError> {
        let mut stream = TcpStream::connect((host, port)).await?;
        let mut buf = BytesMut::with_capacity(16 * 1024);
        info!("Connected to master at {}:{}; starting handshake.", host, port);

        self.handshake(&mut stream, &mut buf).await?;

        // The snapshot arrives inline right after FULLRESYNC, as a
        // length-prefixed blob with no trailing CRLF.
        let snapshot_frame = read_frame(&mut stream, &mut buf).await?;
        match snapshot_frame {
            RespFrame::RawBytes(raw) | RespFrame::BulkString(raw) => {
                self.ingest_snapshot(&raw);
            }
            other => {
                return Err(CitrineError::ReplicationError(format!(
                    "expected snapshot after FULLRESYNC, got {other:?}"
                )));
            }
        }

        // Offset accounting starts fresh after every full resync.
        self.state
            .replication
            .replica_offset
            .store(0, Ordering::SeqCst);
        info!("Handshake complete; applying the master's command stream.");

        let mut session = SessionState::new();
        loop {
            loop {
                match parse_frame(&buf) {
                    Ok((frame, len)) => {
                        self.apply(frame, len, &mut stream, &mut session).await?;
                        buf.advance(len);
                    }
                    Err(CitrineError::IncompleteData) => break,
                    Err(e) => return Err(e),
                }
            }
            let read = stream.read_buf(&mut buf).await?;
            if read == 0 {
                return Err(CitrineError::ReplicationError(
                    "master closed the connection".to_string(),
                ));
            }
        }
    }

    /// The four-step handshake: PING, both REPLCONF announcements, PSYNC.
    async fn handshake(
        &self,
        stream: &mut TcpStream,
        buf: &mut BytesMut,
    ) -> Result<(), CitrineError> {
        send_command(stream, &["PING"]).await?;
        expect_simple(stream, buf, "PONG").await?;

        let listening_port = self.state.config.port.to_string();
        send_command(stream, &["REPLCONF", "listening-port", &listening_port]).await?;
        expect_simple(stream, buf, "OK").await?;

        send_command(stream, &["REPLCONF", "capa", "psync2"]).await?;
        expect_simple(stream, buf, "OK").await?;

        send_command(stream, &["PSYNC", "?", "-1"]).await?;
        let reply = read_frame(stream, buf).await?;
        match reply {
            RespFrame::SimpleString(s) if s.starts_with("FULLRESYNC") => {
                debug!("Master replied: {}", s);
                Ok(())
            }
            other => Err(CitrineError::ReplicationError(format!(
                "unexpected PSYNC reply: {other:?}"
            ))),
        }
    }

    /// Runs the received snapshot through the loader and merges the entries.
    fn ingest_snapshot(&self, raw: &Bytes) {
        match snapshot::parse_snapshot(raw) {
            Ok(entries) => {
                info!("Loaded {} keys from the master's snapshot.", entries.len());
                self.state.store.lock().load_snapshot_entries(entries);
            }
            Err(e) => warn!("Could not parse the master's snapshot: {}", e),
        }
    }

    /// Applies one frame from the master's stream.
    ///
    /// `REPLCONF GETACK` is answered with the offset accumulated *before*
    /// this frame; everything else executes silently. The offset advances by
    /// the frame's byte length after handling.
    async fn apply(
        &self,
        frame: RespFrame,
        frame_len: usize,
        stream: &mut TcpStream,
        session: &mut SessionState,
    ) -> Result<(), CitrineError> {
        let offset_before = self.state.replication.replica_offset.load(Ordering::SeqCst);

        if is_getack(&frame) {
            let ack = RespFrame::from_argv([
                Bytes::from_static(b"REPLCONF"),
                Bytes::from_static(b"ACK"),
                Bytes::from(offset_before.to_string()),
            ]);
            stream.write_all(&ack.encode_to_vec()?).await?;
            stream.flush().await?;
            debug!("Acknowledged offset {} to master.", offset_before);
        } else {
            match Command::try_from(frame) {
                Ok(command) => {
                    let mut ctx = ExecutionContext {
                        state: self.state.clone(),
                        session_id: MASTER_LINK_SESSION_ID,
                        session,
                        is_replicated: true,
                        propagation_override: None,
                    };
                    // Replies are suppressed: replication applies silently.
                    if let Err(e) = command.execute(&mut ctx).await {
                        warn!("Replicated command '{}' failed: {}", command.name(), e);
                    }
                }
                Err(e) => warn!("Unparsable frame in replication stream: {}", e),
            }
        }

        self.state
            .replication
            .replica_offset
            .store(offset_before + frame_len as u64, Ordering::SeqCst);
        Ok(())
    }
}

/// True for a `REPLCONF GETACK *` frame.
fn is_getack(frame: &RespFrame) -> bool {
    let RespFrame::Array(parts) = frame else {
        return false;
    };
    let name_is_replconf = matches!(
        parts.first(),
        Some(RespFrame::BulkString(name)) if name.eq_ignore_ascii_case(b"REPLCONF")
    );
    let arg_is_getack = matches!(
        parts.get(1),
        Some(RespFrame::BulkString(arg)) if arg.eq_ignore_ascii_case(b"GETACK")
    );
    name_is_replconf && arg_is_getack
}

/// Writes one command argv to the master.
async fn send_command(stream: &mut TcpStream, args: &[&str]) -> Result<(), CitrineError> {
    let frame = RespFrame::from_argv(args.iter().map(|s| Bytes::from(s.to_string())));
    stream.write_all(&frame.encode_to_vec()?).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads whole frames off the socket, buffering until one parses.
async fn read_frame(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<RespFrame, CitrineError> {
    loop {
        match parse_frame(buf) {
            Ok((frame, len)) => {
                buf.advance(len);
                return Ok(frame);
            }
            Err(CitrineError::IncompleteData) => {}
            Err(e) => return Err(e),
        }
        let read = stream.read_buf(buf).await?;
        if read == 0 {
            return Err(CitrineError::ReplicationError(
                "master closed the connection during handshake".to_string(),
            ));
        }
    }
}

/// Awaits a specific simple-string reply from the master.
async fn expect_simple(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    expected: &str,
) -> Result<(), CitrineError> {
    match read_frame(stream, buf).await? {
        RespFrame::SimpleString(s) if s.eq_ignore_ascii_case(expected) => Ok(()),
        other => Err(CitrineError::ReplicationError(format!(
            "expected +{expected}, got {other:?}"
        ))),
    }
}
