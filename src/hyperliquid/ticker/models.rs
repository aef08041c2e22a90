//! Types for interacting with the venue WebSocket API.
//!
//! This module defines the frame shapes shared by both streaming sessions:
//! outbound subscribe/unsubscribe requests, the inbound `{channel, data}`
//! envelope, and the decoded `OrderBookMessage` delivered to market-data
//! observers.
//!
use serde::{Deserialize, Serialize};
use tungstenite::Message;

use crate::hyperliquid::connect::models::L2Book;
use crate::hyperliquid::error::Result;

/// A channel subscription payload.
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type": "l2Book", "coin": "BTC"}`.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Subscription {
    /// L2 order book updates for a coin.
    L2Book { coin: String },
    /// Per-account order state changes.
    OrderUpdates { user: String },
    /// Per-account fills.
    UserFills { user: String },
    /// Per-account positions, balances and asset contexts.
    WebData2 { user: String },
}

/// Represents the structure of a WebSocket subscription request.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// `"subscribe"` or `"unsubscribe"`.
    method: String,
    /// The channel being (un)subscribed.
    subscription: Subscription,
}

impl SubscribeRequest {
    /// Creates a subscribe request for a channel.
    ///
    pub fn subscribe(subscription: Subscription) -> Self {
        Self {
            method: "subscribe".to_string(),
            subscription,
        }
    }

    /// Creates an unsubscribe request for a channel.
    ///
    pub fn unsubscribe(subscription: Subscription) -> Self {
        Self {
            method: "unsubscribe".to_string(),
            subscription,
        }
    }

    /// Serializes the request into a WebSocket text frame.
    ///
    pub fn to_message(&self) -> Result<Message> {
        Ok(Message::Text(serde_json::to_string(self)?))
    }
}

/// Inbound frame envelope: every venue message is `{channel, data}`.
///
#[derive(Debug, Clone, Deserialize)]
pub struct WsEnvelope {
    pub channel: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Kind of order book message.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBookMessageType {
    /// Full book snapshot; replaces prior state.
    Snapshot,
    /// Incremental update; mutates prior state.
    Diff,
}

/// A decoded market-data message delivered to the registered callback.
///
#[derive(Debug, Clone)]
pub struct OrderBookMessage {
    pub message_type: OrderBookMessageType,
    /// Trading pair in `BASE-QUOTE` form.
    pub trading_pair: String,
    /// Timestamp in nanoseconds since epoch.
    pub timestamp: u64,
    /// The book payload.
    pub book: L2Book,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_subscribe_frame_shape() {
        let request = SubscribeRequest::subscribe(Subscription::L2Book {
            coin: "BTC".to_string(),
        });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "subscribe");
        assert_eq!(json["subscription"]["type"], "l2Book");
        assert_eq!(json["subscription"]["coin"], "BTC");
    }

    #[test]
    fn test_unsubscribe_frame_shape() {
        let request = SubscribeRequest::unsubscribe(Subscription::OrderUpdates {
            user: "0xabc".to_string(),
        });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "unsubscribe");
        assert_eq!(json["subscription"]["type"], "orderUpdates");
        assert_eq!(json["subscription"]["user"], "0xabc");
    }

    #[test]
    fn test_envelope_parsing() {
        let envelope: WsEnvelope =
            serde_json::from_str(r#"{"channel": "l2Book", "data": {"coin": "BTC"}}"#).unwrap();
        assert_eq!(envelope.channel, "l2Book");
        assert_eq!(envelope.data["coin"], "BTC");
    }
}
