//! Order and cancel wire types.
//!
//! This module defines the exact JSON shapes the venue's `/exchange`
//! endpoint expects and returns. Field names on outgoing orders are
//! single letters (`a` = asset index, `b` = is-buy, `p` = limit price,
//! `s` = size, `r` = reduce-only, `t` = order type, `c` = cloid); prices and
//! sizes travel as strings.
//!
use serde::{Deserialize, Serialize};

/// Time-in-force accepted by the venue.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tif {
    /// Good-til-cancelled: rest until cancelled.
    Gtc,
    /// Immediate-or-cancel: fill what is possible now, cancel the rest.
    Ioc,
    /// Add-liquidity-only: post-only.
    Alo,
}

/// The `t` field of a wire order: a limit order with a time-in-force.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireOrderType {
    pub limit: WireLimit,
}

impl WireOrderType {
    /// Builds the `{"limit": {"tif": ...}}` payload.
    pub fn limit(tif: Tif) -> Self {
        Self {
            limit: WireLimit { tif },
        }
    }
}

/// Inner limit payload of [`WireOrderType`].
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireLimit {
    pub tif: Tif,
}

/// One order element of a batched order action.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireOrder {
    /// Asset index from the venue universe.
    #[serde(rename = "a")]
    pub asset: u32,
    /// `true` for buy.
    #[serde(rename = "b")]
    pub is_buy: bool,
    /// Limit price as a decimal string.
    #[serde(rename = "p")]
    pub limit_px: String,
    /// Size as a decimal string.
    #[serde(rename = "s")]
    pub size: String,
    /// Reduce-only flag.
    #[serde(rename = "r")]
    pub reduce_only: bool,
    /// Order type and time-in-force.
    #[serde(rename = "t")]
    pub order_type: WireOrderType,
    /// Client order id: `0x` + 32 hex characters.
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub cloid: Option<String>,
}

/// An order action for the `/exchange` endpoint.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub grouping: String,
    pub orders: Vec<WireOrder>,
}

impl OrderAction {
    /// Builds an ungrouped order action from its order elements.
    pub fn new(orders: Vec<WireOrder>) -> Self {
        Self {
            kind: "order".to_string(),
            grouping: "na".to_string(),
            orders,
        }
    }
}

/// One cancel element of a cancel action.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCancel {
    /// Asset index from the venue universe.
    #[serde(rename = "a")]
    pub asset: u32,
    /// Venue order id.
    #[serde(rename = "o")]
    pub oid: u64,
}

/// A cancel action for the `/exchange` endpoint.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub cancels: Vec<WireCancel>,
}

impl CancelAction {
    /// Builds a cancel action from its cancel elements.
    pub fn new(cancels: Vec<WireCancel>) -> Self {
        Self {
            kind: "cancel".to_string(),
            cancels,
        }
    }
}

/// Per-order outcome inside an exchange response.
///
/// The venue reports either a tagged object (`{"resting": {...}}`,
/// `{"filled": {...}}`, `{"error": "..."}`) or, for cancels, the plain
/// string `"success"`.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireOrderStatus {
    Tagged(TaggedStatus),
    Plain(String),
}

/// The tagged form of [`WireOrderStatus`].
///
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaggedStatus {
    /// The order rested on the book.
    #[serde(rename_all = "camelCase")]
    Resting { oid: u64 },
    /// The order filled immediately.
    #[serde(rename_all = "camelCase")]
    Filled {
        oid: u64,
        #[serde(default)]
        total_sz: Option<String>,
        #[serde(default)]
        avg_px: Option<String>,
    },
    /// The order was rejected; the payload is the venue's raw reason tag.
    Error(String),
}

impl WireOrderStatus {
    /// Venue order id carried by a `resting` or `filled` status.
    pub fn oid(&self) -> Option<u64> {
        match self {
            WireOrderStatus::Tagged(TaggedStatus::Resting { oid })
            | WireOrderStatus::Tagged(TaggedStatus::Filled { oid, .. }) => Some(*oid),
            _ => None,
        }
    }

    /// Rejection tag carried by an `error` status.
    pub fn error(&self) -> Option<&str> {
        match self {
            WireOrderStatus::Tagged(TaggedStatus::Error(reason)) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// `true` for a plain `"success"` status (cancel acknowledgements).
    pub fn is_success(&self) -> bool {
        matches!(self, WireOrderStatus::Plain(s) if s == "success")
    }
}

/// Response envelope of the `/exchange` endpoint.
///
/// A top-level `status` of `"err"` is a hard rejection; otherwise the
/// per-order outcomes are in `response.data.statuses`.
///
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeResponse {
    pub status: String,
    #[serde(default)]
    pub response: Option<ExchangeResponseValue>,
}

/// The `response` field: a structured body on success, a bare message on a
/// hard rejection.
///
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExchangeResponseValue {
    Body(ExchangeResponseBody),
    Message(String),
}

/// Body of a successful exchange response.
///
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeResponseBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<ExchangeResponseData>,
}

/// Data section carrying per-order statuses.
///
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeResponseData {
    #[serde(default)]
    pub statuses: Vec<WireOrderStatus>,
}

impl ExchangeResponse {
    /// `true` unless the venue reported a top-level hard rejection.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// First per-order status, when present.
    pub fn first_status(&self) -> Option<&WireOrderStatus> {
        match self.response.as_ref()? {
            ExchangeResponseValue::Body(body) => body.data.as_ref()?.statuses.first(),
            ExchangeResponseValue::Message(_) => None,
        }
    }

    /// The bare rejection message of a `status: "err"` response, if any.
    pub fn rejection_message(&self) -> Option<&str> {
        match self.response.as_ref()? {
            ExchangeResponseValue::Message(message) => Some(message.as_str()),
            ExchangeResponseValue::Body(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wire_order_serialization() {
        let order = WireOrder {
            asset: 4,
            is_buy: true,
            limit_px: "2500.13".to_string(),
            size: "0.123".to_string(),
            reduce_only: false,
            order_type: WireOrderType::limit(Tif::Gtc),
            cloid: Some("0x0123456789abcdef0123456789abcdef".to_string()),
        };
        let action = OrderAction::new(vec![order]);
        let json = serde_json::to_value(&action).unwrap();

        assert_eq!(json["type"], "order");
        assert_eq!(json["grouping"], "na");
        let o = &json["orders"][0];
        assert_eq!(o["a"], 4);
        assert_eq!(o["b"], true);
        assert_eq!(o["p"], "2500.13");
        assert_eq!(o["s"], "0.123");
        assert_eq!(o["r"], false);
        assert_eq!(o["t"]["limit"]["tif"], "Gtc");
        assert_eq!(o["c"], "0x0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_cancel_action_serialization() {
        let action = CancelAction::new(vec![WireCancel { asset: 4, oid: 98765 }]);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "cancel");
        assert_eq!(json["cancels"][0]["a"], 4);
        assert_eq!(json["cancels"][0]["o"], 98765);
    }

    #[test]
    fn test_parse_resting_response() {
        let json = r#"{
            "status": "ok",
            "response": {"type": "order", "data": {"statuses": [{"resting": {"oid": 98765}}]}}
        }"#;
        let response: ExchangeResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_ok());
        let status = response.first_status().unwrap();
        assert_eq!(status.oid(), Some(98765));
        assert!(status.error().is_none());
    }

    #[test]
    fn test_parse_filled_response() {
        let json = r#"{
            "status": "ok",
            "response": {"type": "order", "data": {"statuses": [
                {"filled": {"oid": 77, "totalSz": "0.1", "avgPx": "2500.0"}}
            ]}}
        }"#;
        let response: ExchangeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_status().unwrap().oid(), Some(77));
    }

    #[test]
    fn test_parse_error_status() {
        let json = r#"{
            "status": "ok",
            "response": {"type": "order", "data": {"statuses": [{"error": "BadAloPxRejected"}]}}
        }"#;
        let response: ExchangeResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_ok());
        assert_eq!(
            response.first_status().unwrap().error(),
            Some("BadAloPxRejected")
        );
    }

    #[test]
    fn test_parse_hard_rejection_and_cancel_success() {
        let hard: ExchangeResponse =
            serde_json::from_str(r#"{"status": "err", "response": "User or API Wallet does not exist."}"#)
                .unwrap();
        assert!(!hard.is_ok());
        assert_eq!(
            hard.rejection_message(),
            Some("User or API Wallet does not exist.")
        );
        assert!(hard.first_status().is_none());

        let cancel: ExchangeResponse = serde_json::from_str(
            r#"{"status": "ok", "response": {"type": "cancel", "data": {"statuses": ["success"]}}}"#,
        )
        .unwrap();
        assert!(cancel.first_status().unwrap().is_success());
    }
}
