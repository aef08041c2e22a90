//! Venue metadata types.
//!
//! The `/info` endpoint with `{"type": "meta"}` returns the perpetual asset
//! universe. The position of an asset in the `universe` array is its asset
//! index, which wire requests refer to instead of the coin name.
//!
use serde::{Deserialize, Serialize};

/// The venue's perpetual asset universe.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// All tradable assets; the array index of an entry is its asset index.
    pub universe: Vec<AssetMeta>,
}

/// Metadata for a single tradable asset.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    /// Coin code (e.g. `"BTC"`).
    pub name: String,
    /// Number of decimal places accepted for sizes.
    pub sz_decimals: u32,
    /// Maximum leverage for the asset.
    #[serde(default)]
    pub max_leverage: Option<u32>,
    /// Whether only isolated margin is allowed.
    #[serde(default)]
    pub only_isolated: Option<bool>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_meta() {
        let json = r#"{
            "universe": [
                {"name": "BTC", "szDecimals": 5, "maxLeverage": 50},
                {"name": "ETH", "szDecimals": 4, "maxLeverage": 50, "onlyIsolated": false}
            ]
        }"#;
        let meta: Meta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.universe.len(), 2);
        assert_eq!(meta.universe[0].name, "BTC");
        assert_eq!(meta.universe[0].sz_decimals, 5);
        assert_eq!(meta.universe[1].max_leverage, Some(50));
    }
}
