//! Concurrent in-flight order tracker.
//!
//! The tracker is the sole authority over [`InFlightOrder`] state. It keeps
//! a dual index — by client order id and by venue order id — under a single
//! lock domain so the pair stays atomic, and applies a deterministic
//! transition policy that tolerates out-of-order and duplicate venue
//! notifications:
//!
//! - updates older than the record's `last_update_timestamp` are discarded;
//! - updates with an equal timestamp are accepted only if they advance
//!   strictly forward in the lifecycle DAG;
//! - terminal states absorb all further updates silently;
//! - trade application is idempotent per trade id.
//!
//! The tracker is callable from any number of tasks or threads. Reads take
//! the shared lock; writes take the exclusive lock for the duration of a
//! single record mutation.
//!
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::hyperliquid::error::{HalyardError, Result};
use crate::hyperliquid::orders::in_flight::{InFlightOrder, OrderState, OrderUpdate, TradeUpdate};

// Tolerance when comparing accumulated fills against the order amount.
const FILL_EPSILON: f64 = 1e-9;

/// Result of applying an [`OrderUpdate`].
///
/// `applied` is `false` when the update was discarded (stale timestamp,
/// illegal transition, or terminal absorption); the exchange-id binding may
/// still have happened in that case.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub previous_state: OrderState,
    pub new_state: OrderState,
    pub applied: bool,
}

/// Result of applying a [`TradeUpdate`].
///
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome {
    pub previous_state: OrderState,
    pub new_state: OrderState,
    /// `false` when the trade id had already been applied or the record was
    /// terminal.
    pub applied: bool,
    /// Cumulative filled amount after application.
    pub filled_amount: f64,
    /// VWAP over all applied trades after application.
    pub average_fill_price: f64,
}

// Both maps live behind one lock so id binding and reverse-index
// registration are atomic.
#[derive(Default)]
struct TrackerIndex {
    orders: HashMap<String, InFlightOrder>,
    by_exchange_id: HashMap<String, String>,
}

/// Concurrent dual-index store of in-flight orders.
///
#[derive(Default)]
pub struct ClientOrderTracker {
    inner: RwLock<TrackerIndex>,
}

impl ClientOrderTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a new order.
    ///
    /// # Errors
    ///
    /// Returns [`HalyardError::DuplicateOrder`] when the client order id is
    /// already tracked.
    ///
    pub fn start_tracking(&self, order: InFlightOrder) -> Result<()> {
        let mut index = self.inner.write();
        if index.orders.contains_key(&order.client_order_id) {
            return Err(HalyardError::DuplicateOrder(order.client_order_id));
        }
        if let Some(exchange_order_id) = &order.exchange_order_id {
            index
                .by_exchange_id
                .insert(exchange_order_id.clone(), order.client_order_id.clone());
        }
        debug!(client_order_id = %order.client_order_id, "tracking order");
        index.orders.insert(order.client_order_id.clone(), order);
        Ok(())
    }

    /// Stops tracking an order, removing it and its reverse-index entry.
    ///
    /// Intended for terminal records or for explicitly abandoning an order;
    /// returns the removed record, if any.
    ///
    pub fn stop_tracking(&self, client_order_id: &str) -> Option<InFlightOrder> {
        let mut index = self.inner.write();
        let order = index.orders.remove(client_order_id)?;
        if let Some(exchange_order_id) = &order.exchange_order_id {
            index.by_exchange_id.remove(exchange_order_id);
        }
        Some(order)
    }

    /// Looks up an order by client order id.
    pub fn get_order(&self, client_order_id: &str) -> Option<InFlightOrder> {
        self.inner.read().orders.get(client_order_id).cloned()
    }

    /// Looks up an order through the venue-order-id reverse index.
    pub fn get_order_by_exchange_id(&self, exchange_order_id: &str) -> Option<InFlightOrder> {
        let index = self.inner.read();
        let client_order_id = index.by_exchange_id.get(exchange_order_id)?;
        index.orders.get(client_order_id).cloned()
    }

    /// Looks up an order by its wire `cloid`.
    ///
    /// Linear over the in-flight set, which is small by construction.
    ///
    pub fn get_order_by_cloid(&self, cloid: &str) -> Option<InFlightOrder> {
        self.inner
            .read()
            .orders
            .values()
            .find(|order| order.cloid.as_deref() == Some(cloid))
            .cloned()
    }

    /// Snapshot of all non-terminal orders.
    pub fn all_fillable_orders(&self) -> Vec<InFlightOrder> {
        self.inner
            .read()
            .orders
            .values()
            .filter(|order| order.state.is_fillable())
            .cloned()
            .collect()
    }

    /// Number of tracked orders (including terminal ones).
    pub fn len(&self) -> usize {
        self.inner.read().orders.len()
    }

    /// `true` when no orders are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies a state transition.
    ///
    /// Binds `exchange_order_id` and registers the reverse-index entry on
    /// first sighting, even when the state change itself is discarded — a
    /// late backfill must not be lost.
    ///
    /// # Errors
    ///
    /// Returns [`HalyardError::OrderNotFound`] when the client order id is
    /// not tracked.
    ///
    pub fn process_order_update(&self, update: &OrderUpdate) -> Result<TransitionOutcome> {
        let mut index = self.inner.write();
        let TrackerIndex {
            orders,
            by_exchange_id,
        } = &mut *index;
        let order = orders
            .get_mut(&update.client_order_id)
            .ok_or_else(|| HalyardError::OrderNotFound(update.client_order_id.clone()))?;

        if let Some(exchange_order_id) = &update.exchange_order_id {
            if order.exchange_order_id.is_none() {
                order.exchange_order_id = Some(exchange_order_id.clone());
                by_exchange_id.insert(exchange_order_id.clone(), order.client_order_id.clone());
                debug!(
                    client_order_id = %order.client_order_id,
                    exchange_order_id = %exchange_order_id,
                    "bound exchange order id"
                );
            }
        }

        let previous_state = order.state;
        let discarded = TransitionOutcome {
            previous_state,
            new_state: previous_state,
            applied: false,
        };

        // Terminal records absorb everything silently.
        if previous_state.is_terminal() {
            return Ok(discarded);
        }
        if update.update_timestamp < order.last_update_timestamp {
            debug!(
                client_order_id = %order.client_order_id,
                "discarding stale order update"
            );
            return Ok(discarded);
        }
        if update.update_timestamp == order.last_update_timestamp
            && update.new_state.precedence() <= previous_state.precedence()
        {
            return Ok(discarded);
        }
        // Re-asserting the current state only refreshes nothing; repeated
        // `PartiallyFilled` is the one listed self-transition.
        if update.new_state == previous_state && previous_state != OrderState::PartiallyFilled {
            return Ok(discarded);
        }
        if !previous_state.can_transition_to(update.new_state) {
            debug!(
                client_order_id = %order.client_order_id,
                from = ?previous_state,
                to = ?update.new_state,
                "discarding non-forward state transition"
            );
            return Ok(discarded);
        }

        order.state = update.new_state;
        order.last_update_timestamp = update.update_timestamp;
        if let Some(reason) = &update.reason {
            order.failure_reason = Some(reason.clone());
        }

        Ok(TransitionOutcome {
            previous_state,
            new_state: update.new_state,
            applied: true,
        })
    }

    /// Applies a fill to a tracked order.
    ///
    /// If the trade id has not been seen before, accumulates the filled
    /// amount, folds the fill into the VWAP average and transitions the
    /// record to `Filled` or `PartiallyFilled`. A repeated trade id is a
    /// no-op. A fill arriving in `PendingCancel` still applies and may
    /// supersede the pending cancel.
    ///
    /// # Errors
    ///
    /// Returns [`HalyardError::OrderNotFound`] when the client order id is
    /// not tracked.
    ///
    pub fn process_trade_update(&self, trade: &TradeUpdate) -> Result<TradeOutcome> {
        let mut index = self.inner.write();
        let order = index
            .orders
            .get_mut(&trade.client_order_id)
            .ok_or_else(|| HalyardError::OrderNotFound(trade.client_order_id.clone()))?;

        let previous_state = order.state;
        let unapplied = |order: &InFlightOrder| TradeOutcome {
            previous_state,
            new_state: order.state,
            applied: false,
            filled_amount: order.filled_amount,
            average_fill_price: order.average_fill_price,
        };

        if order.trades.contains(&trade.trade_id) {
            debug!(
                client_order_id = %order.client_order_id,
                trade_id = %trade.trade_id,
                "duplicate trade ignored"
            );
            return Ok(unapplied(order));
        }
        if previous_state.is_terminal() {
            return Ok(unapplied(order));
        }

        let fill = trade.fill_base_amount;
        let previously_filled = order.filled_amount;
        let total = previously_filled + fill;
        if total > 0.0 {
            order.average_fill_price =
                (order.average_fill_price * previously_filled + trade.fill_price * fill) / total;
        }
        order.filled_amount = total.min(order.amount);
        order.trades.insert(trade.trade_id.clone());
        order.last_update_timestamp = order.last_update_timestamp.max(trade.fill_timestamp);

        if total >= order.amount - FILL_EPSILON {
            order.state = OrderState::Filled;
        } else if order.filled_amount > 0.0 {
            order.state = OrderState::PartiallyFilled;
        }

        Ok(TradeOutcome {
            previous_state,
            new_state: order.state,
            applied: true,
            filled_amount: order.filled_amount,
            average_fill_price: order.average_fill_price,
        })
    }
}
