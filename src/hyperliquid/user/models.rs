//! Types for the private user stream.
//!
//! The authenticated session subscribes to three per-account channels:
//! `orderUpdates` (order state changes), `userFills` (executions) and
//! `webData2` (positions, margin summary and per-asset contexts). Frames
//! decode into a [`UserStreamMessage`], the single type the connector's
//! routing handler consumes.
//!
use serde::{Deserialize, Serialize};

/// A decoded message from the private stream.
///
#[derive(Debug, Clone)]
pub enum UserStreamMessage {
    /// An order's venue-side state changed.
    OrderUpdate(WsOrderUpdate),
    /// A fill occurred.
    Trade(WsFill),
    /// The account balance changed.
    BalanceUpdate(BalanceUpdate),
    /// The account's positions (and asset contexts) changed.
    PositionUpdate(PositionSnapshot),
}

/// One entry of an `orderUpdates` frame.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsOrderUpdate {
    pub order: WsBasicOrder,
    /// Venue status: `open`, `filled`, `canceled`, `rejected`, ...
    pub status: String,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub status_timestamp: u64,
}

/// The order body carried inside [`WsOrderUpdate`].
///
/// `sz` is the *remaining* size; the filled amount is `orig_sz - sz`.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsBasicOrder {
    pub coin: String,
    /// `"B"` for buy, `"A"` for sell.
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub limit_px: String,
    /// Remaining size as a decimal string.
    pub sz: String,
    pub oid: u64,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub timestamp: u64,
    /// Original size as a decimal string.
    pub orig_sz: String,
    #[serde(default)]
    pub cloid: Option<String>,
}

impl WsBasicOrder {
    /// Original order size.
    pub fn orig_size(&self) -> f64 {
        self.orig_sz.parse().unwrap_or(0.0)
    }

    /// Filled size derived from original minus remaining.
    pub fn filled_size(&self) -> f64 {
        let remaining: f64 = self.sz.parse().unwrap_or(0.0);
        (self.orig_size() - remaining).max(0.0)
    }
}

/// A `userFills` frame: a batch of fills, flagged when it is the initial
/// post-(re)connect snapshot.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsFills {
    #[serde(default)]
    pub is_snapshot: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub fills: Vec<WsFill>,
}

/// A single execution from the `userFills` channel.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsFill {
    pub coin: String,
    /// Fill price as a decimal string.
    pub px: String,
    /// Fill size as a decimal string.
    pub sz: String,
    /// `"B"` for buy, `"A"` for sell.
    #[serde(default)]
    pub side: String,
    /// Milliseconds since epoch.
    pub time: u64,
    /// Venue order id.
    pub oid: u64,
    /// Venue trade id.
    pub tid: u64,
    /// Fee as a decimal string; negative values are maker rebates.
    #[serde(default)]
    pub fee: String,
    #[serde(default)]
    pub fee_token: Option<String>,
    /// `true` when the fill crossed the book (taker).
    #[serde(default)]
    pub crossed: Option<bool>,
    #[serde(default)]
    pub cloid: Option<String>,
    #[serde(default)]
    pub closed_pnl: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub start_position: Option<String>,
}

impl WsFill {
    /// Parsed fill price.
    pub fn price(&self) -> f64 {
        self.px.parse().unwrap_or(0.0)
    }

    /// Parsed fill size.
    pub fn size(&self) -> f64 {
        self.sz.parse().unwrap_or(0.0)
    }

    /// Parsed fee amount.
    pub fn fee_amount(&self) -> f64 {
        self.fee.parse().unwrap_or(0.0)
    }
}

/// An account balance update derived from the `webData2` margin summary.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub asset: String,
    pub available_balance: f64,
    pub total_balance: f64,
    /// Nanoseconds since epoch.
    pub timestamp: u64,
}

/// Positions plus per-asset contexts from a `webData2` frame.
///
/// `asset_ctxs` is ordered like the venue universe, so the connector can
/// join it against the asset index map for funding/mark/index prices.
///
#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    pub asset_positions: Vec<WsAssetPosition>,
    pub asset_ctxs: Vec<WsAssetCtx>,
    /// Nanoseconds since epoch.
    pub timestamp: u64,
}

/// The decoded body of a `webData2` frame.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsWebData2 {
    #[serde(default)]
    pub clearinghouse_state: Option<WsClearinghouseState>,
    #[serde(default)]
    pub asset_ctxs: Vec<WsAssetCtx>,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub server_time: u64,
}

/// Account-level clearinghouse state.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsClearinghouseState {
    #[serde(default)]
    pub margin_summary: Option<WsMarginSummary>,
    /// Withdrawable balance as a decimal string.
    #[serde(default)]
    pub withdrawable: Option<String>,
    #[serde(default)]
    pub asset_positions: Vec<WsAssetPosition>,
}

/// Account margin summary.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsMarginSummary {
    #[serde(default)]
    pub account_value: String,
    #[serde(default)]
    pub total_margin_used: Option<String>,
    #[serde(default)]
    pub total_ntl_pos: Option<String>,
}

/// One position wrapper from the clearinghouse state.
///
#[derive(Debug, Clone, Deserialize)]
pub struct WsAssetPosition {
    pub position: WsPosition,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// A single open position.
///
/// `szi` is signed: positive for long, negative for short.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsPosition {
    pub coin: String,
    /// Signed size as a decimal string.
    pub szi: String,
    #[serde(default)]
    pub entry_px: Option<String>,
    #[serde(default)]
    pub position_value: Option<String>,
    #[serde(default)]
    pub unrealized_pnl: Option<String>,
    #[serde(default)]
    pub liquidation_px: Option<String>,
    #[serde(default)]
    pub margin_used: Option<String>,
    #[serde(default)]
    pub leverage: Option<WsLeverage>,
    #[serde(default)]
    pub cum_funding: Option<WsCumFunding>,
}

/// Leverage setting of a position.
///
#[derive(Debug, Clone, Deserialize)]
pub struct WsLeverage {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: u32,
}

/// Accumulated funding of a position.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsCumFunding {
    #[serde(default)]
    pub since_open: Option<String>,
}

/// Per-asset market context, ordered like the venue universe.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsAssetCtx {
    /// Funding rate as a decimal string.
    #[serde(default)]
    pub funding: Option<String>,
    #[serde(default)]
    pub mark_px: Option<String>,
    #[serde(default)]
    pub oracle_px: Option<String>,
    #[serde(default)]
    pub mid_px: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_order_update() {
        let json = r#"{
            "order": {
                "coin": "ETH", "side": "B", "limitPx": "2500.0", "sz": "0.05",
                "oid": 98765, "timestamp": 1718000000000, "origSz": "0.1",
                "cloid": "0x0123456789abcdef0123456789abcdef"
            },
            "status": "open",
            "statusTimestamp": 1718000000123
        }"#;
        let update: WsOrderUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.order.oid, 98765);
        assert_eq!(update.status, "open");
        assert!((update.order.orig_size() - 0.1).abs() < 1e-12);
        assert!((update.order.filled_size() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_parse_user_fills() {
        let json = r#"{
            "isSnapshot": false,
            "user": "0xabc",
            "fills": [{
                "coin": "ETH", "px": "2500.0", "sz": "0.1", "side": "B",
                "time": 1718000000000, "oid": 98765, "tid": 1234,
                "fee": "-0.01", "feeToken": "USDC", "crossed": false,
                "cloid": "0x0123456789abcdef0123456789abcdef"
            }]
        }"#;
        let fills: WsFills = serde_json::from_str(json).unwrap();
        assert!(!fills.is_snapshot);
        let fill = &fills.fills[0];
        assert_eq!(fill.tid, 1234);
        assert!((fill.price() - 2500.0).abs() < 1e-12);
        assert!((fill.size() - 0.1).abs() < 1e-12);
        assert!(fill.fee_amount() < 0.0);
    }

    #[test]
    fn test_parse_web_data2() {
        let json = r#"{
            "clearinghouseState": {
                "marginSummary": {"accountValue": "10000.5", "totalMarginUsed": "2000"},
                "withdrawable": "8000.5",
                "assetPositions": [{
                    "type": "oneWay",
                    "position": {
                        "coin": "ETH", "szi": "-0.5", "entryPx": "2500.0",
                        "positionValue": "1250.0", "unrealizedPnl": "-12.5",
                        "liquidationPx": "3100.0", "marginUsed": "125.0",
                        "leverage": {"type": "cross", "value": 10}
                    }
                }]
            },
            "assetCtxs": [
                {"funding": "0.0000125", "markPx": "60000.1", "oraclePx": "60000.0"},
                {"funding": "-0.0000042", "markPx": "2500.2", "oraclePx": "2500.1"}
            ],
            "serverTime": 1718000000000
        }"#;
        let data: WsWebData2 = serde_json::from_str(json).unwrap();
        let state = data.clearinghouse_state.unwrap();
        assert_eq!(state.asset_positions.len(), 1);
        assert_eq!(state.asset_positions[0].position.coin, "ETH");
        assert_eq!(
            state.asset_positions[0].position.leverage.as_ref().unwrap().value,
            10
        );
        assert_eq!(data.asset_ctxs.len(), 2);
        assert_eq!(data.asset_ctxs[1].funding.as_deref(), Some("-0.0000042"));
    }
}
