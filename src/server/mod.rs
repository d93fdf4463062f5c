// src/server/mod.rs

//! The TCP server: bind, snapshot loading, the accept loop, and shutdown.

use crate::config::Config;
use crate::connection::ConnectionHandler;
use crate::core::CitrineError;
use crate::core::replication::ReplicationRole;
use crate::core::replication::worker::ReplicaWorker;
use crate::core::state::ServerState;
use crate::core::storage::snapshot;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// A bound but not yet running server. Splitting bind from run lets callers
/// learn the listen address (tests bind port 0) and report bind failures as
/// startup errors.
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl Server {
    /// Builds the shared state, loads the snapshot file if one is configured,
    /// and binds the listener.
    pub async fn bind(config: Config) -> Result<Self, CitrineError> {
        let state = ServerState::new(config);

        if let (Some(dir), Some(filename)) = (&state.config.dir, &state.config.dbfilename) {
            match snapshot::load_file(dir, filename) {
                Ok(Some((raw, entries))) => {
                    info!(
                        "Loaded {} keys from snapshot {}/{}.",
                        entries.len(),
                        dir,
                        filename
                    );
                    state.replication.set_snapshot(raw);
                    state.store.lock().load_snapshot_entries(entries);
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to load snapshot: {}", e),
            }
        }

        let listener = TcpListener::bind(("127.0.0.1", state.config.port)).await?;
        info!("Listening on {}.", listener.local_addr()?);
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, CitrineError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> Arc<ServerState> {
        self.state.clone()
    }

    /// Accepts connections until a shutdown signal arrives. On a replica the
    /// master-link worker runs alongside the accept loop.
    pub async fn run(self) -> Result<(), CitrineError> {
        if matches!(
            self.state.replication.role,
            ReplicationRole::Replica { .. }
        ) {
            tokio::spawn(ReplicaWorker::new(self.state.clone()).run());
        }

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Failed to listen for shutdown signal: {}", e);
                    }
                    info!("Shutdown signal received; closing connections.");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((socket, addr)) => {
                            let session_id = self.state.next_session_id();
                            debug!("Accepted connection from {} as session {}.", addr, session_id);
                            let handler = ConnectionHandler::new(socket, addr, self.state.clone(), session_id);
                            tokio::spawn(handler.run());
                        }
                        Err(e) => warn!("Failed to accept a connection: {}", e),
                    }
                }
            }
        }

        self.state.signal_shutdown();
        Ok(())
    }
}

/// Binds and runs the server with the given configuration.
pub async fn run(config: Config) -> Result<(), CitrineError> {
    Server::bind(config).await?.run().await
}
