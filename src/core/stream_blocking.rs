// src/core/stream_blocking.rs

//! Manages clients that are blocked waiting for data on one or more streams,
//! for the `XREAD` command with the `BLOCK` option.
//!
//! Stream wakers are signal-only: `XADD` wakes every waiter parked on the key,
//! and a woken reader re-runs its query under the store lock using the filters
//! it captured at parse time.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

/// The waker only signals that data has arrived.
type Waker = oneshot::Sender<()>;

/// A shareable waker slot, `take()`-n so it fires at most once.
pub type SharedWaker = Arc<Mutex<Option<Waker>>>;

#[derive(Clone, Debug)]
struct WaiterInfo {
    session_id: u64,
    waker: SharedWaker,
}

/// Manages all clients currently blocked on stream reads.
#[derive(Debug, Default)]
pub struct StreamBlockerManager {
    waiters: DashMap<Bytes, VecDeque<WaiterInfo>>,
}

impl StreamBlockerManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Enqueues one shared waiter on every requested key. Must be called
    /// before the caller releases the store lock.
    pub fn register(&self, keys: &[Bytes], session_id: u64) -> (SharedWaker, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let shared_waker: SharedWaker = Arc::new(Mutex::new(Some(tx)));
        for key in keys {
            self.waiters
                .entry(key.clone())
                .or_default()
                .push_back(WaiterInfo {
                    session_id,
                    waker: shared_waker.clone(),
                });
        }
        debug!(
            "Session {}: registered stream blocker on {} keys",
            session_id,
            keys.len()
        );
        (shared_waker, rx)
    }

    /// Suspends until any of the registered keys is notified or the timeout
    /// elapses. Returns true when woken by a notification.
    pub async fn wait(
        &self,
        keys: &[Bytes],
        waker: &SharedWaker,
        rx: oneshot::Receiver<()>,
        wait_timeout: Option<Duration>,
    ) -> bool {
        let woken = match wait_timeout {
            Some(dur) => matches!(timeout(dur, rx).await, Ok(Ok(()))),
            None => rx.await.is_ok(),
        };
        self.remove_waiter(keys, waker);
        woken
    }

    /// Wakes every live waiter parked on `key`. Called by `XADD`.
    pub fn notify(&self, key: &Bytes) {
        if let Some(mut queue) = self.waiters.get_mut(key) {
            while let Some(info) = queue.pop_front() {
                if let Some(waker) = info.waker.lock().take() {
                    let _ = waker.send(());
                }
            }
        }
    }

    /// Removes a specific waker from all associated key queues.
    fn remove_waiter(&self, keys: &[Bytes], waker_to_remove: &SharedWaker) {
        for key in keys {
            if let Some(mut queue) = self.waiters.get_mut(key) {
                queue.retain(|info| !Arc::ptr_eq(&info.waker, waker_to_remove));
                if queue.is_empty() {
                    drop(queue);
                    self.waiters.remove(key);
                }
            }
        }
    }

    /// Removes all wakers for a given session upon client disconnection.
    pub fn remove_waiters_for_session(&self, session_id: u64) {
        self.waiters.iter_mut().for_each(|mut queue| {
            queue.retain(|info| info.session_id != session_id);
        });
        self.waiters.retain(|_, queue| !queue.is_empty());
    }
}
