// src/core/blocking.rs

//! Manages clients that are blocked waiting for data on list keys (`BLPOP`).
//!
//! The notifier (a push command) pops values off the freshly-pushed list while
//! it still holds the store lock and hands each one directly to the next live
//! waiter. A woken waiter therefore receives its element without re-reading
//! the store, so two waiters parked on the same key can never race for one
//! list head.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

/// The value handed to a waiter when a blocking list pop succeeds.
#[derive(Debug, Clone)]
pub struct PoppedValue {
    pub key: Bytes,
    pub value: Bytes,
}

/// The waker sends the popped value, eliminating the need for a re-read.
type Waker = oneshot::Sender<PoppedValue>;

/// A shareable waker slot. The `Option` allows it to be `take()`-n so it fires
/// at most once; an emptied slot marks a satisfied or cancelled waiter.
pub type SharedWaker = Arc<Mutex<Option<Waker>>>;

/// Holds information about a waiting client, including its session id for cleanup.
#[derive(Clone, Debug)]
struct WaiterInfo {
    session_id: u64,
    waker: SharedWaker,
}

/// Manages all clients currently blocked on list operations.
#[derive(Debug, Default)]
pub struct ListBlockerManager {
    // Key: the list key being watched.
    // Value: a FIFO of waiters for clients blocked on this key.
    waiters: DashMap<Bytes, VecDeque<WaiterInfo>>,
}

impl ListBlockerManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Enqueues a waiter for `key`. Must be called before the caller releases
    /// the store lock, so a push cannot slip between the emptiness check and
    /// the registration.
    pub fn register(
        &self,
        key: &Bytes,
        session_id: u64,
    ) -> (SharedWaker, oneshot::Receiver<PoppedValue>) {
        let (tx, rx) = oneshot::channel();
        let shared_waker: SharedWaker = Arc::new(Mutex::new(Some(tx)));
        self.waiters
            .entry(key.clone())
            .or_default()
            .push_back(WaiterInfo {
                session_id,
                waker: shared_waker.clone(),
            });
        debug!("Session {}: registered list blocker", session_id);
        (shared_waker, rx)
    }

    /// Suspends until the waiter fires or the timeout elapses. `None` timeout
    /// means wait forever. The waiter slot is removed on the way out either way.
    pub async fn wait(
        &self,
        key: &Bytes,
        waker: &SharedWaker,
        rx: oneshot::Receiver<PoppedValue>,
        wait_timeout: Option<Duration>,
    ) -> Option<PoppedValue> {
        let outcome = match wait_timeout {
            Some(dur) => match timeout(dur, rx).await {
                Ok(Ok(popped)) => Some(popped),
                _ => None,
            },
            None => rx.await.ok(),
        };
        self.remove_waiter(key, waker);
        outcome
    }

    /// Called by list push commands with the store lock held. Pops values off
    /// the list and hands them to live waiters, FIFO, skipping slots whose
    /// waker has already been taken or whose receiver is gone. Returns the
    /// number of values handed off.
    pub fn notify_consume(&self, key: &Bytes, list: &mut VecDeque<Bytes>) -> usize {
        let mut handed_off = 0;
        loop {
            if list.is_empty() {
                break;
            }
            let Some(mut queue) = self.waiters.get_mut(key) else {
                break;
            };
            let Some(info) = queue.pop_front() else {
                drop(queue);
                self.waiters.remove(key);
                break;
            };
            let Some(waker) = info.waker.lock().take() else {
                // Stale waiter (timed out or cancelled); skip without consuming.
                continue;
            };
            drop(queue);
            let Some(value) = list.pop_front() else {
                break;
            };
            match waker.send(PoppedValue {
                key: key.clone(),
                value,
            }) {
                Ok(()) => {
                    handed_off += 1;
                    debug!(
                        "Handed off list element to a waiter for key '{}'",
                        String::from_utf8_lossy(key)
                    );
                }
                // Receiver dropped between the liveness check and the send;
                // the element goes back to the head.
                Err(popped) => list.push_front(popped.value),
            }
        }
        handed_off
    }

    /// Removes a specific waker from the key's queue.
    fn remove_waiter(&self, key: &Bytes, waker_to_remove: &SharedWaker) {
        if let Some(mut queue) = self.waiters.get_mut(key) {
            queue.retain(|info| !Arc::ptr_eq(&info.waker, waker_to_remove));
            if queue.is_empty() {
                drop(queue);
                self.waiters.remove(key);
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

    /// The number of waiters currently parked on `key` (live or stale).
    pub fn waiter_count(&self, key: &Bytes) -> usize {
        self.waiters.get(key).map_or(0, |queue| queue.len())
    }
}
