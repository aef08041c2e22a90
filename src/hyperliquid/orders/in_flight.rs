//! In-flight order lifecycle types.
//!
//! An [`InFlightOrder`] is the tracker's record of a single order from
//! submission intent to final resolution. State moves through a small DAG:
//!
//! ```text
//! PendingCreate -> Open | Failed
//! Open          -> PartiallyFilled | PendingCancel | Filled | Cancelled | Failed
//! PartiallyFilled -> PartiallyFilled | PendingCancel | Filled | Cancelled | Failed
//! PendingCancel -> Cancelled | Filled | PartiallyFilled | Failed
//! ```
//!
//! `Filled`, `Cancelled` and `Failed` are terminal; a record in a terminal
//! state is immutable.
//!
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::hyperliquid::types::{OrderType, PositionAction, TradeType};

/// Lifecycle state of a tracked order.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Inserted locally; the submit has not been acknowledged yet.
    PendingCreate,
    /// Acknowledged and resting on the venue.
    Open,
    /// Some, but not all, of the amount has filled.
    PartiallyFilled,
    /// A cancel request was accepted; awaiting confirmation. A fill can
    /// still race the cancel.
    PendingCancel,
    /// Fully filled (terminal).
    Filled,
    /// Cancelled (terminal).
    Cancelled,
    /// Rejected or failed (terminal).
    Failed,
}

impl OrderState {
    /// `true` for `Filled`, `Cancelled` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Filled | OrderState::Cancelled | OrderState::Failed
        )
    }

    /// `true` when the order can still receive fills.
    pub fn is_fillable(&self) -> bool {
        !self.is_terminal()
    }

    // Rank used for equal-timestamp tie-breaks: a state change with the same
    // timestamp is accepted only if it advances strictly forward.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            OrderState::PendingCreate => 0,
            OrderState::Open => 1,
            OrderState::PartiallyFilled => 2,
            OrderState::PendingCancel => 3,
            OrderState::Filled | OrderState::Cancelled | OrderState::Failed => 4,
        }
    }

    /// Whether the lifecycle DAG permits moving from `self` to `target`.
    ///
    /// An explicit venue rejection (`Failed`) is reachable from any
    /// non-terminal state; terminal states permit nothing.
    ///
    pub fn can_transition_to(&self, target: OrderState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target == OrderState::Failed {
            return true;
        }
        match self {
            OrderState::PendingCreate => matches!(
                target,
                OrderState::Open | OrderState::PartiallyFilled | OrderState::Filled
            ),
            OrderState::Open => matches!(
                target,
                OrderState::PartiallyFilled
                    | OrderState::PendingCancel
                    | OrderState::Filled
                    | OrderState::Cancelled
            ),
            OrderState::PartiallyFilled => matches!(
                target,
                OrderState::PartiallyFilled
                    | OrderState::PendingCancel
                    | OrderState::Filled
                    | OrderState::Cancelled
            ),
            OrderState::PendingCancel => matches!(
                target,
                OrderState::Cancelled | OrderState::Filled | OrderState::PartiallyFilled
            ),
            _ => false,
        }
    }
}

/// Maker/taker side of a fill.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liquidity {
    /// The order rested in the book.
    Maker,
    /// The order crossed the book.
    Taker,
}

/// The tracker's record of a single order.
///
/// Owned exclusively by the tracker; the connector reads and mutates it only
/// through tracker operations. Invariants: `0 <= filled_amount <= amount`,
/// `exchange_order_id` is assigned exactly once, and terminal records are
/// immutable.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InFlightOrder {
    /// Locally generated client order id (primary key).
    pub client_order_id: String,
    /// Venue-assigned order id, bound on first sighting.
    pub exchange_order_id: Option<String>,
    /// Trading pair in `BASE-QUOTE` form.
    pub trading_pair: String,
    /// Order type.
    pub order_type: OrderType,
    /// Trade side.
    pub trade_type: TradeType,
    /// Position action.
    pub position_action: PositionAction,
    /// Quantized limit price.
    pub price: f64,
    /// Quantized order size in base units.
    pub amount: f64,
    /// Cumulative filled size.
    pub filled_amount: f64,
    /// Volume-weighted average fill price over all applied trades.
    pub average_fill_price: f64,
    /// Current lifecycle state.
    pub state: OrderState,
    /// Creation timestamp (nanoseconds since epoch).
    pub creation_timestamp: u64,
    /// Timestamp of the last applied state update.
    pub last_update_timestamp: u64,
    /// Wire `cloid` submitted with the order.
    pub cloid: Option<String>,
    /// Failure reason, recorded on transition to `Failed`.
    pub failure_reason: Option<String>,
    /// Trade ids already applied to this order (idempotency set).
    pub trades: HashSet<String>,
}

impl InFlightOrder {
    /// Creates a new record in `PendingCreate`.
    #[allow(clippy::too_many_arguments)]
    pub fn new<InS>(
        client_order_id: InS,
        trading_pair: InS,
        order_type: OrderType,
        trade_type: TradeType,
        position_action: PositionAction,
        price: f64,
        amount: f64,
        creation_timestamp: u64,
    ) -> Self
    where
        InS: Into<String>,
    {
        Self {
            client_order_id: client_order_id.into(),
            exchange_order_id: None,
            trading_pair: trading_pair.into(),
            order_type,
            trade_type,
            position_action,
            price,
            amount,
            filled_amount: 0.0,
            average_fill_price: 0.0,
            state: OrderState::PendingCreate,
            creation_timestamp,
            last_update_timestamp: creation_timestamp,
            cloid: None,
            failure_reason: None,
            trades: HashSet::new(),
        }
    }

    /// Sets the wire `cloid`.
    pub fn with_cloid<InS>(mut self, cloid: InS) -> Self
    where
        InS: Into<String>,
    {
        self.cloid = Some(cloid.into());
        self
    }

    /// Unfilled remainder of the order.
    pub fn remaining_amount(&self) -> f64 {
        (self.amount - self.filled_amount).max(0.0)
    }

    /// `true` when the record reached a terminal state.
    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }
}

/// A state transition request for a tracked order.
///
/// Drives the tracker's state machine separately from trade application.
///
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub client_order_id: String,
    /// Venue order id, bound to the record on first sighting.
    pub exchange_order_id: Option<String>,
    pub trading_pair: Option<String>,
    pub new_state: OrderState,
    /// Nanoseconds since epoch; updates older than the record's last update
    /// are discarded.
    pub update_timestamp: u64,
    /// Failure or cancellation reason, when the venue supplied one.
    pub reason: Option<String>,
}

/// A single fill applied to a tracked order.
///
/// Application is idempotent per `(client_order_id, trade_id)`.
///
#[derive(Debug, Clone)]
pub struct TradeUpdate {
    pub trade_id: String,
    pub client_order_id: String,
    pub exchange_order_id: String,
    pub trading_pair: String,
    pub fill_price: f64,
    /// Filled size in base units.
    pub fill_base_amount: f64,
    /// Filled value in quote units.
    pub fill_quote_amount: f64,
    pub fee_amount: f64,
    pub fee_currency: String,
    /// Nanoseconds since epoch.
    pub fill_timestamp: u64,
    pub liquidity: Liquidity,
}
