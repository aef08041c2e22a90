//! Hyperliquid perpetual connector.
//!
//! This module contains everything needed to trade perpetual futures on
//! Hyperliquid: the REST client for placement and metadata, the streaming
//! sessions for market data and account events, the in-flight order tracker
//! that reconciles optimistic local state against asynchronous venue
//! notifications, and the orchestrating connector itself.
//!
//! # Submodules
//!
//! - `book`: in-memory L2 order book with snapshot and delta application.
//! - `connect`: async HTTP client, endpoint configuration, credentials and
//!     the `/info` / `/exchange` API groups with their wire models.
//! - `error`: custom error types and results used throughout the crate.
//! - `events`: listener traits for order, trade, balance, position and
//!     error events.
//! - `orders`: the `InFlightOrder` lifecycle and the concurrent tracker.
//! - `perpetual`: the `HyperliquidPerpetual` connector orchestrator.
//! - `reasons`: canonical rejection reason codes and the venue tag mapper.
//! - `rules`: per-pair trading rules, quantization and validation.
//! - `ticker`: supervised market-data WebSocket session.
//! - `traits`: the signer seam and the connector contract traits.
//! - `types`: shared domain enums, order parameters and positions.
//! - `user`: supervised private-stream WebSocket session.
//! - `wire`: wire-format helpers (decimal strings, symbols, cloids).
//!
pub mod book;
pub mod connect;
pub mod error;
pub mod events;
pub mod orders;
pub mod perpetual;
pub mod reasons;
pub mod rules;
pub mod ticker;
pub mod traits;
pub mod types;
pub mod user;
pub mod wire;
