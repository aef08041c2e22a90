//! L2 order book wire types.
//!
//! The `/info` endpoint with `{"type": "l2Book", "coin": ...}` and the
//! WebSocket `l2Book` channel both deliver the same shape: a two-element
//! `levels` array (bids first, asks second) of `{px, sz, n}` rows with
//! prices and sizes as strings.
//!
use serde::{Deserialize, Serialize};

/// A single aggregated price level on the wire.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L2Level {
    /// Price as a decimal string.
    pub px: String,
    /// Size as a decimal string.
    pub sz: String,
    /// Number of orders at the level.
    #[serde(default)]
    pub n: u32,
}

/// An L2 book snapshot as delivered by the venue.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L2Book {
    /// Coin code. Absent on some REST responses.
    #[serde(default)]
    pub coin: String,
    /// Venue timestamp in milliseconds.
    #[serde(default)]
    pub time: u64,
    /// `levels[0]` are bids, `levels[1]` are asks.
    pub levels: Vec<Vec<L2Level>>,
}

impl L2Book {
    /// Bid rows of the snapshot.
    pub fn bids(&self) -> &[L2Level] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ask rows of the snapshot.
    pub fn asks(&self) -> &[L2Level] {
        self.levels.get(1).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_l2_book() {
        let json = r#"{
            "coin": "ETH",
            "time": 1718000000000,
            "levels": [
                [{"px": "2500.0", "sz": "1.5", "n": 3}, {"px": "2499.5", "sz": "2.0", "n": 1}],
                [{"px": "2500.5", "sz": "0.7", "n": 2}]
            ]
        }"#;
        let book: L2Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.coin, "ETH");
        assert_eq!(book.bids().len(), 2);
        assert_eq!(book.asks().len(), 1);
        assert_eq!(book.bids()[0].px, "2500.0");
        assert_eq!(book.asks()[0].sz, "0.7");
    }

    #[test]
    fn test_missing_sides_are_empty() {
        let book: L2Book = serde_json::from_str(r#"{"levels": []}"#).unwrap();
        assert!(book.bids().is_empty());
        assert!(book.asks().is_empty());
    }
}
