//! Market-data streaming session.
//!
//! This module provides the connector's public-data side: a supervised
//! WebSocket session that subscribes to per-pair L2 book channels, decodes
//! snapshot frames into [`OrderBookMessage`]s and delivers them to a
//! registered callback. Subscriptions are idempotent and survive
//! reconnects; transport failures are retried with a fixed backoff while
//! the session is supervised.
//!

// Contains the `MarketDataSession` struct, which owns the socket and the
// supervised connect/subscribe/stream loop.
mod client;
pub use client::{MarketDataSession, OrderBookCallback, RECONNECT_DELAY};
pub(crate) use client::shutdown_requested;

// Defines the session state machine and the replayed subscription set.
mod stream;
pub use stream::{SessionState, SubscriptionSet};

// Contains the frame types shared by both streaming sessions and the
// decoded `OrderBookMessage`.
pub mod models;
pub use models::{OrderBookMessage, OrderBookMessageType};
