// src/core/pubsub.rs

//! The publish-subscribe system: channel and pattern subscriptions backed by
//! broadcast channels.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::debug;

/// The capacity of each individual broadcast channel.
const CHANNEL_CAPACITY: usize = 128;

/// A message delivered to pattern subscribers: `(pattern, channel, payload)`.
pub type PMessage = (Bytes, Bytes, Bytes);

/// `PubSubManager` is the central hub for all Pub/Sub functionality.
#[derive(Debug, Default)]
pub struct PubSubManager {
    /// A map from a channel name to its broadcast sender.
    channels: DashMap<Bytes, Arc<Sender<Bytes>>>,
    /// A map from a pattern to its broadcast sender.
    patterns: DashMap<Bytes, Arc<Sender<PMessage>>>,
}

impl PubSubManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Subscribes a client to a channel, creating it on first use. Returns the
    /// `Receiver` the client's connection loop will listen on.
    pub fn subscribe(&self, channel_name: &Bytes) -> Receiver<Bytes> {
        self.channels
            .entry(channel_name.clone())
            .or_insert_with(|| Arc::new(broadcast::channel(CHANNEL_CAPACITY).0))
            .value()
            .subscribe()
    }

    /// Subscribes a client to a pattern.
    pub fn subscribe_pattern(&self, pattern: &Bytes) -> Receiver<PMessage> {
        self.patterns
            .entry(pattern.clone())
            .or_insert_with(|| Arc::new(broadcast::channel(CHANNEL_CAPACITY).0))
            .value()
            .subscribe()
    }

    /// Publishes a message to direct subscribers of `channel_name` and to the
    /// subscribers of every matching pattern. Returns the number of receivers
    /// the message reached.
    pub fn publish(&self, channel_name: &Bytes, message: Bytes) -> usize {
        let mut receivers = 0;

        if let Some(channel) = self.channels.get(channel_name) {
            // `send` returns the number of receivers the message was sent to.
            receivers += channel.send(message.clone()).unwrap_or(0);
        }

        for entry in self.patterns.iter() {
            let pattern = entry.key();
            if glob_match(pattern, channel_name) {
                let pmessage: PMessage = (pattern.clone(), channel_name.clone(), message.clone());
                receivers += entry.value().send(pmessage).unwrap_or(0);
            }
        }

        receivers
    }

    /// Drops channels and patterns that no longer have any subscribers. Called
    /// lazily from unsubscribe paths.
    pub fn purge_empty_channels(&self) -> usize {
        let mut purged = 0;
        self.channels.retain(|_, sender| {
            if sender.receiver_count() == 0 {
                purged += 1;
                false
            } else {
                true
            }
        });
        self.patterns.retain(|_, sender| {
            if sender.receiver_count() == 0 {
                purged += 1;
                false
            } else {
                true
            }
        });
        if purged > 0 {
            debug!("Purged {} empty Pub/Sub channels and patterns.", purged);
        }
        purged
    }

    /// The number of subscribers currently attached to `channel_name`.
    pub fn subscriber_count(&self, channel_name: &Bytes) -> usize {
        self.channels
            .get(channel_name)
            .map_or(0, |s| s.receiver_count())
    }
}

/// Matches `text` against `pattern`, where `*` matches any (possibly empty)
/// run of bytes. This is the only wildcard the pattern commands support.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some((ch, rest)) => text.split_first().is_some_and(|(t, ts)| t == ch && glob_match(rest, ts)),
    }
}
