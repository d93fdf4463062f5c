// src/connection/session.rs

//! Defines the state associated with a single client session.

use crate::core::pubsub::PMessage;
use bytes::Bytes;
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Holds the state specific to a single client session. Owned by the
/// connection task and destroyed on disconnect.
#[derive(Debug, Default)]
pub struct SessionState {
    /// The set of channels the client is directly subscribed to.
    pub subscribed_channels: HashSet<Bytes>,
    /// The set of patterns the client is subscribed to.
    pub subscribed_patterns: HashSet<Bytes>,
    /// A collection of `broadcast::Receiver`s for active subscriptions.
    pub pubsub_receivers: Vec<SubscriptionReceiver>,
}

/// An enum holding a receiver for either a channel or pattern subscription.
#[derive(Debug)]
pub enum SubscriptionReceiver {
    /// A receiver for a specific channel.
    Channel(Bytes, broadcast::Receiver<Bytes>),
    /// A receiver for a pattern.
    Pattern(Bytes, broadcast::Receiver<PMessage>),
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of active subscriptions. A non-zero count puts the session
    /// into subscription mode, where only the Pub/Sub command whitelist is
    /// accepted.
    pub fn subscription_count(&self) -> usize {
        self.subscribed_channels.len() + self.subscribed_patterns.len()
    }
}
