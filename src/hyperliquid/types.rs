//! Common types shared across the connector.
//!
//! This module defines the domain enums used by the order pipeline (order
//! type, trade side, position action) together with the derivative-specific
//! value types (`Position`, position side/mode) and the `OrderParams` struct
//! that strategies hand to [`buy`]/[`sell`].
//!
//! [`buy`]: crate::hyperliquid::perpetual::HyperliquidPerpetual::buy
//! [`sell`]: crate::hyperliquid::perpetual::HyperliquidPerpetual::sell
//!
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Returns the current wall-clock time as nanoseconds since the Unix epoch.
///
/// All timestamps carried by tracker records, order updates and stream
/// messages are expressed in this unit.
pub fn current_timestamp_ns() -> u64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .max(0) as u64
}

/// Kind of exchange a connector talks to.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    /// Spot trading venue.
    Spot,
    /// Perpetual futures/swaps venue.
    DerivativePerpetual,
    /// Dated futures venue.
    DerivativeFutures,
    /// Automated market maker DEX.
    AmmDex,
    /// Orderbook-based DEX.
    OrderbookDex,
}

/// Type of order submitted to the venue.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Standard limit order (rests until cancelled).
    Limit,
    /// Market order; mapped to an immediate-or-cancel limit order with an
    /// extreme limit price on venues without a native market type.
    Market,
    /// Post-only limit order (must add liquidity).
    LimitMaker,
    /// Stop-limit order.
    StopLimit,
    /// Stop-market order.
    StopMarket,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "limit"),
            OrderType::Market => write!(f, "market"),
            OrderType::LimitMaker => write!(f, "limit_maker"),
            OrderType::StopLimit => write!(f, "stop_limit"),
            OrderType::StopMarket => write!(f, "stop_market"),
        }
    }
}

/// Side of a trade.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// Buy / long.
    Buy,
    /// Sell / short.
    Sell,
}

impl TradeType {
    /// `true` for [`TradeType::Buy`].
    pub fn is_buy(&self) -> bool {
        matches!(self, TradeType::Buy)
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => write!(f, "buy"),
            TradeType::Sell => write!(f, "sell"),
        }
    }
}

/// Action on a derivative position.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionAction {
    /// Not specified (spot, or first entry).
    #[default]
    Nil,
    /// Open a new position.
    Open,
    /// Close an existing position (submitted reduce-only).
    Close,
}

/// Side of a derivative position.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    /// Long position.
    Long,
    /// Short position.
    Short,
    /// Both sides (hedge mode).
    Both,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
            PositionSide::Both => write!(f, "both"),
        }
    }
}

/// Position mode of a derivatives account.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionMode {
    /// One-way mode (net position per symbol).
    #[default]
    OneWay,
    /// Hedge mode (separate long and short positions).
    Hedge,
}

/// Parameters for placing an order.
///
/// `extra_params` carries venue-specific knobs; the only key interpreted by
/// this connector is `"cloid"`, an explicit `0x`-prefixed 32-hex-character
/// client order id used for venue-side idempotency. When absent, a
/// deterministic `cloid` is derived from the generated client order id.
///
#[derive(Debug, Clone)]
pub struct OrderParams {
    /// Trading pair in `BASE-QUOTE` form (e.g. `BTC-USD`).
    pub trading_pair: String,
    /// Order size in base units.
    pub amount: f64,
    /// Limit price. Ignored for market orders.
    pub price: f64,
    /// Order type.
    pub order_type: OrderType,
    /// Position action (derivatives); `Close` maps to reduce-only.
    pub position_action: PositionAction,
    /// Optional leverage override.
    pub leverage: Option<u32>,
    /// Trigger price for stop orders.
    pub trigger_price: Option<f64>,
    /// Venue-specific extra parameters.
    pub extra_params: HashMap<String, String>,
}

impl OrderParams {
    /// Convenience constructor for a plain limit order.
    pub fn limit<InS>(trading_pair: InS, amount: f64, price: f64) -> Self
    where
        InS: Into<String>,
    {
        Self {
            trading_pair: trading_pair.into(),
            amount,
            price,
            order_type: OrderType::Limit,
            position_action: PositionAction::Nil,
            leverage: None,
            trigger_price: None,
            extra_params: HashMap::new(),
        }
    }

    /// Convenience constructor for a market order.
    pub fn market<InS>(trading_pair: InS, amount: f64) -> Self
    where
        InS: Into<String>,
    {
        Self {
            order_type: OrderType::Market,
            ..Self::limit(trading_pair, amount, 0.0)
        }
    }
}

/// An open position on a perpetual venue.
///
/// Populated from the user stream; the connector keeps the latest snapshot
/// per symbol and exposes it through
/// [`get_position`](crate::hyperliquid::traits::PerpetualConnector::get_position).
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Trading symbol (e.g. `BTC-USD`).
    pub symbol: String,
    /// Position side.
    pub side: PositionSide,
    /// Position size in base units (positive for both sides).
    pub size: f64,
    /// Average entry price.
    pub entry_price: f64,
    /// Current mark price.
    pub mark_price: f64,
    /// Liquidation price, `0.0` when the venue reports none.
    pub liquidation_price: f64,
    /// Unrealized profit and loss.
    pub unrealized_pnl: f64,
    /// Realized profit and loss.
    pub realized_pnl: f64,
    /// Current leverage.
    pub leverage: u32,
    /// Margin allocated to the position.
    pub margin: f64,
    /// Last update timestamp (nanoseconds since epoch).
    pub timestamp: u64,
    /// Accumulated funding fee, when reported.
    pub funding_fee: Option<f64>,
    /// Venue-assigned position id, when reported.
    pub position_id: Option<String>,
}

impl Position {
    /// `true` when the position is long.
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// `true` when the position is short.
    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Notional value of the position at the mark price.
    pub fn position_value(&self) -> f64 {
        self.size * self.mark_price
    }

    /// Return on equity, in percent.
    pub fn roe(&self) -> f64 {
        if self.margin <= 0.0 {
            return 0.0;
        }
        (self.unrealized_pnl / self.margin) * 100.0
    }

    /// Distance between mark price and liquidation price, in percent.
    pub fn distance_to_liquidation(&self) -> f64 {
        if self.mark_price <= 0.0 {
            return 0.0;
        }
        ((self.liquidation_price - self.mark_price) / self.mark_price).abs() * 100.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_position_metrics() {
        let position = Position {
            symbol: "BTC-USD".to_string(),
            side: PositionSide::Long,
            size: 0.5,
            entry_price: 60_000.0,
            mark_price: 62_000.0,
            liquidation_price: 55_800.0,
            unrealized_pnl: 1_000.0,
            realized_pnl: 0.0,
            leverage: 10,
            margin: 3_000.0,
            timestamp: 0,
            funding_fee: None,
            position_id: None,
        };

        assert!(position.is_long());
        assert!(!position.is_short());
        assert_eq!(position.position_value(), 31_000.0);
        assert!((position.roe() - 33.333_333).abs() < 1e-3);
        assert!((position.distance_to_liquidation() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_params_constructors() {
        let limit = OrderParams::limit("ETH-USD", 0.1, 2_500.0);
        assert_eq!(limit.order_type, OrderType::Limit);
        assert_eq!(limit.position_action, PositionAction::Nil);

        let market = OrderParams::market("ETH-USD", 0.1);
        assert_eq!(market.order_type, OrderType::Market);
        assert_eq!(market.price, 0.0);
    }
}
