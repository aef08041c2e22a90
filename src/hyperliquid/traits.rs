//! Trait definitions for implementing custom types that work with `halyard`.
//!
//! This module defines the seams between the connector core and its
//! collaborators: the external request signer, and the connector contract
//! that strategies program against.
//!
//! # Traits
//!
//! - `SignL1Action`: produces a signed request envelope for an exchange
//!     action. Credential storage and signature construction live entirely
//!     behind this trait; the core never interprets the signature format.
//! - `Connector`: the venue-agnostic connector contract — identity,
//!     lifecycle, order placement and trading-rule access.
//! - `PerpetualConnector`: derivative-specific read accessors layered on top
//!     of `Connector`.
//!
use async_trait::async_trait;

use crate::hyperliquid::error::Result;
use crate::hyperliquid::rules::TradingRule;
use crate::hyperliquid::types::{
    ConnectorType, OrderParams, Position, PositionMode,
};

/// Signs an exchange action for submission.
///
/// Implementations hold the account's signing key material; the connector
/// passes the action JSON and receives an opaque, fully signed request body
/// ready to POST to the venue's `/exchange` endpoint.
///
pub trait SignL1Action: Send + Sync {
    /// Produces the signed envelope for an action.
    ///
    /// # Arguments
    ///
    /// * `action` - The action payload (order, cancel, ...).
    /// * `is_mainnet` - Whether the signature targets mainnet or testnet.
    ///
    fn sign_l1_action(&self, action: &serde_json::Value, is_mainnet: bool)
        -> Result<serde_json::Value>;
}

/// The connector contract strategies program against.
///
/// `buy` and `sell` are non-blocking: they return a freshly generated client
/// order id immediately and submit asynchronously. Order outcomes arrive
/// through the registered event listeners.
///
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connector name (e.g. `"hyperliquid_perpetual"`).
    fn name(&self) -> &str;

    /// Domain: equals [`name`](Connector::name) on mainnet, with a
    /// `"_testnet"` suffix otherwise.
    fn domain(&self) -> String;

    /// Kind of venue this connector talks to.
    fn connector_type(&self) -> ConnectorType;

    /// Loads venue metadata (trading rules, asset indices). Must be called
    /// before placing orders.
    async fn initialize(&self) -> Result<()>;

    /// Starts the connector's sessions and worker.
    async fn start(&self) -> Result<()>;

    /// Stops all sessions and the worker, closing sockets on the way out.
    async fn stop(&self);

    /// `true` while the private stream is connected.
    fn is_connected(&self) -> bool;

    /// `true` when the connector is started, streams are up and trading
    /// rules are loaded.
    fn is_ready(&self) -> bool;

    /// Places a buy order. Returns the client order id immediately.
    fn buy(&self, params: OrderParams) -> String;

    /// Places a sell order. Returns the client order id immediately.
    fn sell(&self, params: OrderParams) -> String;

    /// Cancels an order, resolving to `true` once the venue accepts the
    /// cancel request.
    async fn cancel(&self, trading_pair: &str, client_order_id: &str) -> Result<bool>;

    /// Trading rule for a pair, when loaded.
    fn get_trading_rule(&self, trading_pair: &str) -> Option<TradingRule>;

    /// All loaded trading rules.
    fn get_all_trading_rules(&self) -> Vec<TradingRule>;
}

/// Derivative-specific read accessors, cached from the user stream.
///
pub trait PerpetualConnector: Connector {
    /// Current position for a symbol, if any.
    fn get_position(&self, symbol: &str) -> Option<Position>;

    /// All active positions.
    fn get_all_positions(&self) -> Vec<Position>;

    /// Latest funding rate for a symbol, if known.
    fn get_funding_rate(&self, symbol: &str) -> Option<f64>;

    /// Latest mark price for a symbol, if known.
    fn get_mark_price(&self, symbol: &str) -> Option<f64>;

    /// Latest index (oracle) price for a symbol, if known.
    fn get_index_price(&self, symbol: &str) -> Option<f64>;

    /// Current position mode.
    fn get_position_mode(&self) -> PositionMode;

    /// Sets the position mode.
    fn set_position_mode(&self, mode: PositionMode);
}
