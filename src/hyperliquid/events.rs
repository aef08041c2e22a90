//! Event listener interfaces.
//!
//! The connector fans venue notifications out to registered observers.
//! Listeners are registered by handle (`Arc<dyn ...>`) and never own
//! lifecycle state; every callback is invoked on the stream or worker
//! processing path and therefore MUST be non-blocking and side-effect only —
//! blocking in a callback stalls event ingestion.
//!
use std::fmt;

use crate::hyperliquid::types::PositionSide;

/// Tag identifying an order event, used for logging and dispatch.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventType {
    /// Order successfully submitted to the exchange.
    Created,
    /// Order received a fill.
    Filled,
    /// Order fully filled.
    Completed,
    /// Order cancelled.
    Cancelled,
    /// Order expired before resting.
    Expired,
    /// Order failed or was rejected.
    Failed,
}

impl fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderEventType::Created => "order_created",
            OrderEventType::Filled => "order_filled",
            OrderEventType::Completed => "order_completed",
            OrderEventType::Cancelled => "order_cancelled",
            OrderEventType::Expired => "order_expired",
            OrderEventType::Failed => "order_failed",
        };
        write!(f, "{}", s)
    }
}

/// Observer of order lifecycle events.
///
/// Implement this trait to receive notifications about order state changes,
/// fills and failures.
///
pub trait OrderEventListener: Send + Sync {
    /// Called when an order is successfully created on the exchange.
    ///
    /// # Arguments
    ///
    /// * `client_order_id` - Locally generated order id.
    /// * `exchange_order_id` - Venue-assigned order id.
    ///
    fn on_order_created(&self, client_order_id: &str, exchange_order_id: &str);

    /// Called when an order receives a fill, with the actual execution price
    /// and size.
    ///
    fn on_order_filled(&self, client_order_id: &str, fill_price: f64, fill_amount: f64);

    /// Called exactly once when an order is fully filled, with the
    /// accumulated average fill price and total filled amount.
    ///
    fn on_order_completed(&self, client_order_id: &str, average_fill_price: f64, total_filled: f64);

    /// Called when an order is cancelled.
    fn on_order_cancelled(&self, client_order_id: &str);

    /// Called when an order fails or is rejected, with a human-readable
    /// reason.
    ///
    fn on_order_failed(&self, client_order_id: &str, reason: &str);

    /// Called when an order expires before resting.
    ///
    /// The default implementation treats expiry as a cancellation.
    ///
    fn on_order_expired(&self, client_order_id: &str) {
        self.on_order_cancelled(client_order_id);
    }
}

/// Observer of individual fills, with more detail than
/// [`OrderEventListener::on_order_filled`].
///
pub trait TradeEventListener: Send + Sync {
    /// Called for every trade applied to a tracked order.
    ///
    /// # Arguments
    ///
    /// * `client_order_id` - Locally generated order id.
    /// * `trade_id` - Venue-unique trade id.
    /// * `price` - Execution price.
    /// * `amount` - Filled quantity.
    /// * `fee_currency` - Currency the fee is denominated in.
    /// * `fee_amount` - Fee amount; negative values are maker rebates.
    ///
    fn on_trade(
        &self,
        client_order_id: &str,
        trade_id: &str,
        price: f64,
        amount: f64,
        fee_currency: &str,
        fee_amount: f64,
    );
}

/// Observer of connector-level errors.
///
pub trait ErrorEventListener: Send + Sync {
    /// Called when an error occurs outside any single order's lifecycle.
    fn on_error(&self, error_code: &str, error_message: &str);
}

/// Observer of account balance changes.
///
pub trait BalanceEventListener: Send + Sync {
    /// Called when the account balance changes.
    fn on_balance_update(&self, asset: &str, available_balance: f64, total_balance: f64);
}

/// Observer of derivative position changes.
///
pub trait PositionEventListener: Send + Sync {
    /// Called when a position changes.
    fn on_position_update(
        &self,
        symbol: &str,
        side: PositionSide,
        size: f64,
        entry_price: f64,
        unrealized_pnl: f64,
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        cancelled: AtomicUsize,
    }

    impl OrderEventListener for Recorder {
        fn on_order_created(&self, _: &str, _: &str) {}
        fn on_order_filled(&self, _: &str, _: f64, _: f64) {}
        fn on_order_completed(&self, _: &str, _: f64, _: f64) {}
        fn on_order_cancelled(&self, _: &str) {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
        fn on_order_failed(&self, _: &str, _: &str) {}
    }

    #[test]
    fn test_expired_defaults_to_cancelled() {
        let recorder = Recorder {
            cancelled: AtomicUsize::new(0),
        };
        recorder.on_order_expired("hal-1-1");
        assert_eq!(recorder.cancelled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(OrderEventType::Created.to_string(), "order_created");
        assert_eq!(OrderEventType::Failed.to_string(), "order_failed");
    }
}
