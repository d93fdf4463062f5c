// src/core/replication/mod.rs

//! Master-side replication state: the replica registry, write fan-out, and
//! the WAIT/GETACK acknowledgement flow.

pub mod worker;

use crate::core::CitrineError;
use crate::core::protocol::RespFrame;
use crate::core::storage::snapshot::EMPTY_SNAPSHOT;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Whether this server is a master or follows another server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationRole {
    Master,
    Replica {
        master_host: String,
        master_port: u16,
    },
}

/// A connected replica after PSYNC promotion. The master only ever reads from
/// the socket inside the WAIT acknowledgement flow; the write half carries the
/// propagated command stream.
#[derive(Debug, Clone)]
pub struct ReplicaHandle {
    pub session_id: u64,
    pub addr: SocketAddr,
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

/// Process-wide replication state, shared by command handlers, the connection
/// loop, and (on a replica) the replication worker.
#[derive(Debug)]
pub struct ReplicationState {
    pub role: ReplicationRole,
    /// The 40-character replication id generated at startup.
    pub master_replid: String,
    /// Master side: bytes of command stream fanned out so far.
    pub master_repl_offset: AtomicU64,
    /// Replica side: bytes of the master's command stream applied so far.
    pub replica_offset: AtomicU64,
    /// Set when a write has been propagated and not yet acknowledged; WAIT
    /// short-circuits when clear.
    pub need_replica_ack: AtomicBool,
    replicas: DashMap<u64, ReplicaHandle>,
    /// Serializes fan-out so every replica observes writes in accept order.
    propagate_lock: Mutex<()>,
    /// The snapshot payload served on PSYNC: the loaded dump file, or the
    /// fixed empty dump.
    snapshot: RwLock<Bytes>,
}

impl ReplicationState {
    pub fn new(role: ReplicationRole) -> Self {
        let mut id_bytes = [0u8; 20];
        rand::thread_rng().fill(&mut id_bytes);
        Self {
            role,
            master_replid: hex::encode(id_bytes),
            master_repl_offset: AtomicU64::new(0),
            replica_offset: AtomicU64::new(0),
            need_replica_ack: AtomicBool::new(false),
            replicas: DashMap::new(),
            propagate_lock: Mutex::new(()),
            snapshot: RwLock::new(EMPTY_SNAPSHOT.clone()),
        }
    }

    pub fn is_master(&self) -> bool {
        self.role == ReplicationRole::Master
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    pub fn snapshot_bytes(&self) -> Bytes {
        self.snapshot.read().clone()
    }

    pub fn set_snapshot(&self, bytes: Bytes) {
        *self.snapshot.write() = bytes;
    }

    /// Promotes a client connection into the replica registry after PSYNC.
    /// The server stops reading the socket as a client from this point on.
    pub fn add_replica(&self, session_id: u64, addr: SocketAddr, stream: TcpStream) {
        let (read_half, write_half) = stream.into_split();
        self.replicas.insert(
            session_id,
            ReplicaHandle {
                session_id,
                addr,
                reader: Arc::new(Mutex::new(read_half)),
                writer: Arc::new(Mutex::new(write_half)),
            },
        );
        info!("Promoted connection {} to replica channel.", addr);
    }

    pub fn remove_replica(&self, session_id: u64) {
        if self.replicas.remove(&session_id).is_some() {
            debug!("Removed replica for session {}.", session_id);
        }
    }

    /// Fans a command argv out to every connected replica, in accept order.
    /// A failing replica is logged and dropped; it never blocks the client
    /// reply on the master.
    pub async fn propagate(&self, argv: &[Bytes]) -> Result<(), CitrineError> {
        let _order_guard = self.propagate_lock.lock().await;

        let encoded = RespFrame::from_argv(argv.iter().cloned()).encode_to_vec()?;
        let handles: Vec<ReplicaHandle> =
            self.replicas.iter().map(|e| e.value().clone()).collect();

        let mut failed = Vec::new();
        for handle in &handles {
            let mut writer = handle.writer.lock().await;
            let write_result = async {
                writer.write_all(&encoded).await?;
                writer.flush().await
            }
            .await;
            if let Err(e) = write_result {
                warn!("Failed to propagate to replica {}: {}", handle.addr, e);
                failed.push(handle.session_id);
            }
        }
        for session_id in failed {
            self.remove_replica(session_id);
        }

        self.master_repl_offset
            .fetch_add(encoded.len() as u64, Ordering::SeqCst);
        self.need_replica_ack
            .store(!self.replicas.is_empty(), Ordering::SeqCst);
        Ok(())
    }

    /// The WAIT flow. With no unacknowledged writes the current replica count
    /// is returned immediately. Otherwise a `REPLCONF GETACK *` is sent to
    /// every replica in parallel and the call waits, up to `timeout_ms`
    /// (0 = indefinitely), for all of them to answer; pending probes are
    /// cancelled and the number of replicas that responded is returned.
    pub async fn wait_for_acks(&self, timeout_ms: u64) -> Result<usize, CitrineError> {
        if !self.need_replica_ack.load(Ordering::SeqCst) {
            return Ok(self.replicas.len());
        }
        self.need_replica_ack.store(false, Ordering::SeqCst);

        if self.replicas.is_empty() {
            return Ok(0);
        }

        let getack =
            RespFrame::from_argv(["REPLCONF", "GETACK", "*"].map(Bytes::from)).encode_to_vec()?;

        let mut probes: JoinSet<std::io::Result<()>> = JoinSet::new();
        for entry in self.replicas.iter() {
            let handle = entry.value().clone();
            let payload = getack.clone();
            probes.spawn(async move {
                {
                    let mut writer = handle.writer.lock().await;
                    writer.write_all(&payload).await?;
                    writer.flush().await?;
                }
                let mut buf = [0u8; 1024];
                let n = handle.reader.lock().await.read(&mut buf).await?;
                if n == 0 {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "replica closed during GETACK",
                    ));
                }
                debug!("Received ack from replica {}", handle.addr);
                Ok(())
            });
        }

        let deadline = (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms));
        let mut acked = 0;
        loop {
            let next = match deadline {
                Some(d) => {
                    let Some(remaining) = d.checked_duration_since(Instant::now()) else {
                        break;
                    };
                    match timeout(remaining, probes.join_next()).await {
                        Ok(joined) => joined,
                        Err(_) => break,
                    }
                }
                None => probes.join_next().await,
            };
            match next {
                Some(Ok(Ok(()))) => acked += 1,
                Some(_) => {}
                None => break,
            }
        }
        probes.abort_all();

        Ok(acked)
    }

    /// The `INFO replication` section body.
    pub fn info_section(&self) -> String {
        match &self.role {
            ReplicationRole::Master => format!(
                "role:master\r\nmaster_replid:{}\r\nmaster_repl_offset:{}",
                self.master_replid,
                self.master_repl_offset.load(Ordering::SeqCst)
            ),
            ReplicationRole::Replica { .. } => "role:slave".to_string(),
        }
    }
}
