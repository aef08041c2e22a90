//! Trading rules and order quantization.
//!
//! Every trading pair carries a set of venue constraints: tick size, step
//! size, decimal precision, size and notional minimums. Rules are loaded
//! once at connector initialization from the venue metadata endpoint and are
//! treated as immutable afterwards. The connector quantizes every outgoing
//! price and size against the pair's rule and validates the result before
//! anything touches the network.
//!
use serde::{Deserialize, Serialize};

/// Trading rules and constraints for a specific trading pair.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingRule {
    /// Trading pair in `BASE-QUOTE` form.
    pub trading_pair: String,

    /// Minimum accepted price. `0.0` means unconstrained.
    pub min_price: f64,
    /// Maximum accepted price. `0.0` means unconstrained.
    pub max_price: f64,
    /// Minimum price increment.
    pub tick_size: f64,
    /// Number of decimal places for prices on the wire.
    pub price_decimals: u32,
    /// Maximum significant digits for prices on the wire. The venue
    /// accepts at most five significant figures on perpetual prices; the
    /// cap is applied when a price is encoded for submission.
    pub price_significant_digits: u32,

    /// Minimum order size in base units.
    pub min_order_size: f64,
    /// Maximum order size in base units. `0.0` means unconstrained.
    pub max_order_size: f64,
    /// Minimum order value (`price * size`). `0.0` means unconstrained.
    pub min_notional: f64,
    /// Minimum size increment.
    pub step_size: f64,
    /// Number of decimal places for sizes on the wire.
    pub size_decimals: u32,

    /// Venue supports post-only (add-liquidity-only) orders.
    pub supports_post_only: bool,
    /// Venue supports market orders (natively or via IOC mapping).
    pub supports_market_orders: bool,
    /// Venue supports stop orders.
    pub supports_stop_orders: bool,
}

impl Default for TradingRule {
    fn default() -> Self {
        Self {
            trading_pair: String::new(),
            min_price: 0.0,
            max_price: 0.0,
            tick_size: 0.0,
            price_decimals: 8,
            price_significant_digits: 5,
            min_order_size: 0.0,
            max_order_size: 0.0,
            min_notional: 0.0,
            step_size: 0.0,
            size_decimals: 8,
            supports_post_only: true,
            supports_market_orders: true,
            supports_stop_orders: false,
        }
    }
}

impl TradingRule {
    /// `true` when the rule carries enough constraints to trade against.
    pub fn is_trading_enabled(&self) -> bool {
        self.tick_size > 0.0 && self.step_size > 0.0
    }

    /// Quantizes a price to the nearest tick, rounded to `price_decimals`.
    ///
    /// A rule without a tick size returns the price unchanged. The result
    /// stays within half a tick of the input; the venue's
    /// `price_significant_digits` cap is a wire-encoding concern and is
    /// applied when the order is serialized for submission, not here.
    ///
    pub fn quantize_price(&self, price: f64) -> f64 {
        if self.tick_size <= 0.0 {
            return price;
        }
        let ticks = (price / self.tick_size).round();
        let quantized = ticks * self.tick_size;
        round_to_decimals(quantized, self.price_decimals)
    }

    /// Quantizes a size to the nearest step, rounded to `size_decimals`.
    ///
    /// A rule without a step size returns the size unchanged.
    ///
    pub fn quantize_size(&self, size: f64) -> f64 {
        if self.step_size <= 0.0 {
            return size;
        }
        let steps = (size / self.step_size).round();
        let quantized = steps * self.step_size;
        round_to_decimals(quantized, self.size_decimals)
    }

    /// Validates an order's `(price, size)` against the rule's bounds.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the order is acceptable, otherwise a precise diagnostic
    /// describing the first violated constraint.
    ///
    pub fn validate_order(&self, price: f64, size: f64) -> Result<(), String> {
        if size < self.min_order_size {
            return Err(format!(
                "order size {} is below minimum {}",
                size, self.min_order_size
            ));
        }
        if self.max_order_size > 0.0 && size > self.max_order_size {
            return Err(format!(
                "order size {} exceeds maximum {}",
                size, self.max_order_size
            ));
        }
        if price < self.min_price {
            return Err(format!(
                "order price {} is below minimum {}",
                price, self.min_price
            ));
        }
        if self.max_price > 0.0 && price > self.max_price {
            return Err(format!(
                "order price {} exceeds maximum {}",
                price, self.max_price
            ));
        }
        let notional = price * size;
        if self.min_notional > 0.0 && notional < self.min_notional {
            return Err(format!(
                "order notional {} is below minimum {}",
                notional, self.min_notional
            ));
        }
        Ok(())
    }
}

// Rounds half-away-from-zero to the given number of decimal places.
fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let multiplier = 10f64.powi(decimals as i32);
    (value * multiplier).round() / multiplier
}
