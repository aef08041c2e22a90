//! Session state and subscription management.
//!
//! Every streaming session moves through the same state machine:
//!
//! ```text
//! Idle -> Connecting -> Subscribing -> Streaming -> (Closing | Faulted)
//!   Faulted -> Backoff -> Connecting            (while supervision holds)
//!   Closing -> Idle                             (graceful stop)
//! ```
//!
//! The subscription set survives reconnects: on every (re)connect the whole
//! set is replayed before the session is considered `Streaming` again.
//!
use std::collections::HashSet;

use parking_lot::Mutex;
use tungstenite::Message;

use crate::hyperliquid::error::Result;
use crate::hyperliquid::ticker::models::{SubscribeRequest, Subscription};
use crate::hyperliquid::wire;

/// Lifecycle state of a streaming session.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started, or stopped gracefully.
    Idle,
    /// TCP/TLS/WebSocket handshake in progress.
    Connecting,
    /// Connected; replaying the subscription set.
    Subscribing,
    /// Receiving frames.
    Streaming,
    /// Graceful shutdown in progress.
    Closing,
    /// The transport failed.
    Faulted,
    /// Waiting out the reconnect delay.
    Backoff,
}

/// The set of trading pairs a market-data session is subscribed to.
///
/// Mutations are idempotent: inserting a pair already present and removing
/// a pair not present are both no-ops, reported through the return value so
/// the session only sends frames for actual changes.
///
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    pairs: Mutex<HashSet<String>>,
}

impl SubscriptionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair; returns `true` when the pair was not yet present.
    pub fn insert(&self, trading_pair: &str) -> bool {
        self.pairs.lock().insert(trading_pair.to_string())
    }

    /// Removes a pair; returns `true` when the pair was present.
    pub fn remove(&self, trading_pair: &str) -> bool {
        self.pairs.lock().remove(trading_pair)
    }

    /// `true` when the pair is currently subscribed.
    pub fn contains(&self, trading_pair: &str) -> bool {
        self.pairs.lock().contains(trading_pair)
    }

    /// Number of subscribed pairs.
    pub fn len(&self) -> usize {
        self.pairs.lock().len()
    }

    /// `true` when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.pairs.lock().is_empty()
    }

    /// Snapshot of the subscribed pairs.
    pub fn snapshot(&self) -> Vec<String> {
        self.pairs.lock().iter().cloned().collect()
    }

    /// Builds the subscribe frames that re-establish every subscription in
    /// the set. Called under a fresh connection before streaming resumes.
    ///
    pub fn replay_frames(&self) -> Result<Vec<Message>> {
        let pairs = self.pairs.lock();
        let mut frames = Vec::with_capacity(pairs.len());
        for pair in pairs.iter() {
            frames.push(l2_book_frame(pair, true)?);
        }
        Ok(frames)
    }
}

/// Builds a subscribe/unsubscribe frame for a pair's `l2Book` channel.
///
pub(crate) fn l2_book_frame(trading_pair: &str, subscribe: bool) -> Result<Message> {
    let subscription = Subscription::L2Book {
        coin: wire::extract_coin(trading_pair).to_string(),
    };
    let request = if subscribe {
        SubscribeRequest::subscribe(subscription)
    } else {
        SubscribeRequest::unsubscribe(subscription)
    };
    request.to_message()
}
