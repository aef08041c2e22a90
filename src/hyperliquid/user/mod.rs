//! Private user-stream session.
//!
//! The authenticated counterpart of [`ticker`](crate::hyperliquid::ticker):
//! a supervised WebSocket session delivering per-account order state
//! changes, fills, balance updates and position snapshots to the
//! connector's routing handler.
//!

// Contains the `UserStreamSession` struct and the frame decoder.
mod client;
pub use client::{UserStreamCallback, UserStreamSession};

#[cfg(test)]
pub(crate) use client::decode_frame as client_decode_for_tests;

// Data models for the private channels.
pub mod models;
pub use models::{BalanceUpdate, PositionSnapshot, UserStreamMessage, WsFill, WsOrderUpdate};
