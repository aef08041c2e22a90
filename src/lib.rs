//! > **Halyard** (IPA: /ˈhæl.jərd/) n.: the line used on a sailing vessel to hoist a sail and hold it taut against the wind.
//!
//! An asynchronous connector library for [Hyperliquid](https://hyperliquid.xyz/)'s
//! perpetual futures exchange.
//!
//! `halyard` translates strategy-issued execution intents into
//! authenticated wire-level interactions with the venue, and keeps a
//! locally consistent view of order and fill state by reconciling
//! optimistic local tracking against asynchronous exchange notifications.
//!
//! # `halyard` Features
//!
//! - **Non-blocking placement**: `buy`/`sell` return a freshly generated
//!    client order id immediately; the wire interaction happens on a worker
//!    task and outcomes arrive through registered event listeners. An order
//!    is tracked *before* its submit is scheduled, so a fill racing the
//!    synchronous acknowledgement always finds its record.
//!
//! - **Race-tolerant order tracking**: a concurrent dual-index tracker
//!    (client order id and venue order id) with a deterministic transition
//!    policy — stale updates are discarded, duplicate fills are idempotent,
//!    terminal states absorb everything.
//!
//! - **Supervised streaming**: persistent WebSocket sessions for L2 book
//!    data and per-account events, with automatic reconnection and
//!    subscription replay on a fixed backoff.
//!
//! - **External signing**: request signing lives behind a trait seam; key
//!    material never enters this crate.
//!
//! - **Distributed Logging**: real-time insight into the connector's
//!    behavior via the `tracing` crate.
//!
//! # Example:
//! ```ignore
//! use std::sync::Arc;
//!
//! use halyard::hyperliquid::connect::config::Config;
//! use halyard::hyperliquid::connect::credentials::AccountCredentials;
//! use halyard::hyperliquid::perpetual::HyperliquidPerpetual;
//! use halyard::hyperliquid::traits::Connector;
//! use halyard::hyperliquid::types::OrderParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Setup tracing
//!     tracing_subscriber::fmt()
//!         .with_max_level(tracing::Level::INFO)
//!         .init();
//!
//!     let config = Config::testnet(AccountCredentials::load_from_env());
//!     let connector = HyperliquidPerpetual::new(config, Arc::new(my_signer))?;
//!
//!     connector.initialize().await?;
//!     connector.start().await?;
//!     connector.subscribe_order_book("ETH-USD");
//!
//!     let client_order_id = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
//!     tracing::info!("placed {client_order_id}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Disclaimer
//!
//! **Important Notice**:
//!
//! * The `halyard` crate is currently in development and should be considered unstable. The API is subject to change without notice, and breaking changes are likely to occur.
//!
//! * The software is provided "as-is" without any warranties, express or implied. The author and contributors of this library do not take responsibility for any financial losses, damages, or other issues that may arise from the use of this project.
#![warn(rust_2018_idioms)]

pub mod hyperliquid;
