// src/core/state.rs

//! Defines the central `ServerState` struct, holding all shared server-wide
//! state: the keyspace, the waiter registries, the Pub/Sub hub, per-connection
//! transaction queues, and replication state.

use crate::config::Config;
use crate::core::blocking::ListBlockerManager;
use crate::core::commands::Command;
use crate::core::pubsub::PubSubManager;
use crate::core::replication::{ReplicationRole, ReplicationState};
use crate::core::storage::Store;
use crate::core::stream_blocking::StreamBlockerManager;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// The central struct holding all shared state. It is wrapped in an `Arc` and
/// passed to every connection handler and background task.
///
/// The keyspace sits behind a single mutex: a command body locks it, runs to
/// completion without suspending, and releases it before any I/O. That single
/// ownership point is what makes command bodies atomic with respect to each
/// other.
#[derive(Debug)]
pub struct ServerState {
    pub config: Config,
    pub store: Mutex<Store>,
    /// Clients blocked on list keys (`BLPOP`).
    pub list_blockers: ListBlockerManager,
    /// Clients blocked on stream keys (`XREAD BLOCK`).
    pub stream_blockers: StreamBlockerManager,
    pub pubsub: PubSubManager,
    /// Open transaction queues, keyed by session id. Presence of an entry
    /// means the connection is inside `MULTI`.
    pub transactions: DashMap<u64, Vec<Command>>,
    pub replication: ReplicationState,
    shutdown_tx: broadcast::Sender<()>,
    next_session_id: AtomicU64,
}

impl ServerState {
    pub fn new(config: Config) -> Arc<Self> {
        let role = match &config.replicaof {
            None => ReplicationRole::Master,
            Some(master) => ReplicationRole::Replica {
                master_host: master.host.clone(),
                master_port: master.port,
            },
        };
        let (shutdown_tx, _) = broadcast::channel(1);
        Arc::new(Self {
            config,
            store: Mutex::new(Store::new()),
            list_blockers: ListBlockerManager::new(),
            stream_blockers: StreamBlockerManager::new(),
            pubsub: PubSubManager::new(),
            transactions: DashMap::new(),
            replication: ReplicationState::new(role),
            shutdown_tx,
            next_session_id: AtomicU64::new(0),
        })
    }

    pub fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals every connection handler and background task to stop.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Tears down everything a disconnected session left behind: its open
    /// transaction and any waiters still parked in the registries.
    pub fn cleanup_session(&self, session_id: u64) {
        self.transactions.remove(&session_id);
        self.list_blockers.remove_waiters_for_session(session_id);
        self.stream_blockers.remove_waiters_for_session(session_id);
        self.pubsub.purge_empty_channels();
    }
}
