//! In-memory L2 order book.
//!
//! A per-pair ladder of aggregated price levels: bids descending, asks
//! ascending. A snapshot replaces the book wholesale; a delta mutates a
//! single level, with a zero size meaning deletion. Levels are keyed by
//! [`Decimal`] because venue prices arrive as strings (which `Decimal`
//! parses exactly) and because `f64` cannot key an ordered map.
//!
//! Thread safety is the caller's concern; the connector keeps each book
//! behind its own lock.
//!
use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::hyperliquid::types::current_timestamp_ns;

/// A single aggregated price level.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBookEntry {
    pub price: Decimal,
    pub size: Decimal,
    pub timestamp: u64,
}

/// In-memory order book for one trading pair.
///
/// Invariants: stored sizes are strictly positive (zero-size updates delete
/// the level), and whenever both sides are non-empty the best bid is below
/// the best ask.
///
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Trading pair in `BASE-QUOTE` form.
    pub trading_pair: String,
    /// Timestamp of the last mutation (nanoseconds since epoch).
    pub timestamp: u64,
    /// Monotonically advancing update sequence.
    pub sequence: u64,

    // Bids iterate in descending price order via `.rev()`.
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl OrderBook {
    /// Creates an empty book for a trading pair.
    pub fn new<InS>(trading_pair: InS) -> Self
    where
        InS: Into<String>,
    {
        Self {
            trading_pair: trading_pair.into(),
            ..Self::default()
        }
    }

    /// Replaces the whole book with a snapshot.
    ///
    /// Levels with non-positive sizes are filtered out rather than stored.
    ///
    pub fn apply_snapshot<B, A>(&mut self, bid_levels: B, ask_levels: A, sequence: u64)
    where
        B: IntoIterator<Item = (Decimal, Decimal)>,
        A: IntoIterator<Item = (Decimal, Decimal)>,
    {
        self.bids.clear();
        self.asks.clear();
        for (price, size) in bid_levels {
            if size > Decimal::ZERO {
                self.bids.insert(price, size);
            }
        }
        for (price, size) in ask_levels {
            if size > Decimal::ZERO {
                self.asks.insert(price, size);
            }
        }
        self.sequence = sequence;
        self.timestamp = current_timestamp_ns();
    }

    /// Applies a differential update to a single level.
    ///
    /// # Arguments
    ///
    /// * `price` - Price level to update.
    /// * `size` - New size; zero (or negative) removes the level.
    /// * `is_bid` - `true` for the bid side.
    ///
    pub fn apply_delta(&mut self, price: Decimal, size: Decimal, is_bid: bool) {
        let side = if is_bid { &mut self.bids } else { &mut self.asks };
        if size > Decimal::ZERO {
            side.insert(price, size);
        } else {
            side.remove(&price);
        }
        self.timestamp = current_timestamp_ns();
    }

    /// Best (highest) bid price.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Best (lowest) ask price.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Size at the best bid.
    pub fn best_bid_size(&self) -> Option<Decimal> {
        self.bids.iter().next_back().map(|(_, size)| *size)
    }

    /// Size at the best ask.
    pub fn best_ask_size(&self) -> Option<Decimal> {
        self.asks.iter().next().map(|(_, size)| *size)
    }

    /// Mid price, when both sides are non-empty.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Absolute spread, when both sides are non-empty.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Spread in basis points relative to the best bid.
    pub fn spread_bps(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid > Decimal::ZERO => {
                Some((ask - bid) / bid * Decimal::from(10_000))
            }
            _ => None,
        }
    }

    /// Top `n` bid levels, best first.
    pub fn get_top_bids(&self, n: usize) -> Vec<OrderBookEntry> {
        self.bids
            .iter()
            .rev()
            .take(n)
            .map(|(price, size)| OrderBookEntry {
                price: *price,
                size: *size,
                timestamp: self.timestamp,
            })
            .collect()
    }

    /// Top `n` ask levels, best first.
    pub fn get_top_asks(&self, n: usize) -> Vec<OrderBookEntry> {
        self.asks
            .iter()
            .take(n)
            .map(|(price, size)| OrderBookEntry {
                price: *price,
                size: *size,
                timestamp: self.timestamp,
            })
            .collect()
    }

    /// `true` when both sides carry at least one level.
    pub fn is_valid(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    /// Drops all levels and resets the sequence.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.sequence = 0;
        self.timestamp = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot_book() -> OrderBook {
        let mut book = OrderBook::new("BTC-USD");
        book.apply_snapshot(
            vec![
                (dec!(60000), dec!(1.5)),
                (dec!(59999), dec!(2.0)),
                (dec!(59998), dec!(0)), // filtered: zero sizes are deletes
            ],
            vec![(dec!(60001), dec!(1.0)), (dec!(60002), dec!(3.0))],
            7,
        );
        book
    }

    #[test]
    fn test_snapshot_filters_and_orders() {
        let book = snapshot_book();
        assert_eq!(book.sequence, 7);
        assert_eq!(book.best_bid(), Some(dec!(60000)));
        assert_eq!(book.best_ask(), Some(dec!(60001)));
        assert_eq!(book.best_bid_size(), Some(dec!(1.5)));
        assert_eq!(book.best_ask_size(), Some(dec!(1.0)));

        let bids = book.get_top_bids(10);
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].price, dec!(60000));
        assert_eq!(bids[1].price, dec!(59999));

        let asks = book.get_top_asks(1);
        assert_eq!(asks.len(), 1);
        assert_eq!(asks[0].price, dec!(60001));
    }

    #[test]
    fn test_delta_insert_update_delete() {
        let mut book = snapshot_book();

        book.apply_delta(dec!(60000.5), dec!(0.25), true);
        assert_eq!(book.best_bid(), Some(dec!(60000.5)));

        book.apply_delta(dec!(60000.5), dec!(0.75), true);
        assert_eq!(book.best_bid_size(), Some(dec!(0.75)));

        book.apply_delta(dec!(60000.5), dec!(0), true);
        assert_eq!(book.best_bid(), Some(dec!(60000)));

        // after any sequence of deltas the book stays crossed-free
        assert!(book.best_bid().unwrap() < book.best_ask().unwrap());
    }

    #[test]
    fn test_mid_spread() {
        let book = snapshot_book();
        assert_eq!(book.mid_price(), Some(dec!(60000.5)));
        assert_eq!(book.spread(), Some(dec!(1)));
        let bps = book.spread_bps().unwrap();
        assert!(bps > dec!(0.16) && bps < dec!(0.17));
    }

    #[test]
    fn test_snapshot_replaces_previous_state() {
        let mut book = snapshot_book();
        book.apply_snapshot(vec![(dec!(100), dec!(1))], vec![(dec!(101), dec!(1))], 8);
        assert_eq!(book.get_top_bids(10).len(), 1);
        assert_eq!(book.get_top_asks(10).len(), 1);
        assert_eq!(book.best_bid(), Some(dec!(100)));
    }

    #[test]
    fn test_validity_and_clear() {
        let mut book = snapshot_book();
        assert!(book.is_valid());
        book.clear();
        assert!(!book.is_valid());
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.mid_price(), None);
        assert_eq!(book.sequence, 0);
    }
}
