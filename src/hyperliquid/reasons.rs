//! Canonical rejection reason codes.
//!
//! Venues report rejections as free-form tags (`BadAloPxRejected`,
//! `PerpMarginRejected`, ...). This module maps those raw strings onto a
//! small canonical enum so strategies can react to a rejection without
//! knowing the venue's vocabulary. Unknown tags map to
//! [`ReasonCode::VenueReject`].
//!
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical rejection/outcome codes.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Success.
    Ok,
    /// Validation rejection (bad size, missing price, unsupported type).
    InvalidParams,
    /// Position cap or margin tier violation.
    RiskBlocked,
    /// Margin or spot balance too low.
    InsufficientBalance,
    /// Post-only order would have matched immediately.
    PostOnlyViolation,
    /// Below the venue's notional or size minimum.
    MinSize,
    /// Tick or oracle price constraint.
    PriceOutOfBounds,
    /// Venue throttle.
    RateLimited,
    /// Transport failure, timeout or exchange 5xx.
    NetworkError,
    /// TTL elapsed before the order rested.
    Expired,
    /// Catch-all venue refusal.
    VenueReject,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReasonCode::Ok => "ok",
            ReasonCode::InvalidParams => "invalid_params",
            ReasonCode::RiskBlocked => "risk_blocked",
            ReasonCode::InsufficientBalance => "insufficient_balance",
            ReasonCode::PostOnlyViolation => "post_only_violation",
            ReasonCode::MinSize => "min_size",
            ReasonCode::PriceOutOfBounds => "price_out_of_bounds",
            ReasonCode::RateLimited => "rate_limited",
            ReasonCode::NetworkError => "network_error",
            ReasonCode::Expired => "expired",
            ReasonCode::VenueReject => "venue_reject",
        };
        write!(f, "{}", s)
    }
}

/// A canonical code together with a human-readable explanation.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonMapping {
    pub code: ReasonCode,
    pub text: String,
}

/// Maps a canonical-ish raw code (ours or a venue's) to a [`ReasonCode`].
///
/// Accepts both the canonical snake_case spellings and the Hyperliquid-style
/// rejection tags; anything unrecognized maps to `VenueReject`.
///
pub fn canonical_code(raw: &str) -> ReasonCode {
    let lower = raw.to_ascii_lowercase();
    match lower.as_str() {
        "" | "ok" | "accepted" => ReasonCode::Ok,
        "invalid_params" | "invalid_parameters" | "invalid_parameter" | "missing_parameters"
        | "missing_parameter" | "missing_price" | "missing_stop_price" | "missing_cancel_id"
        | "missing_replace_id" | "missing_action" | "invalid_action" | "unsupported_type"
        | "invalid_size" | "invalid_reduce_only" | "parameter_error" => ReasonCode::InvalidParams,
        "risk_blocked" | "risk_violation" | "perpmaxpositionrejected" => ReasonCode::RiskBlocked,
        "insufficient_balance" | "balance_insufficient" | "insufficientspotbalancerejected"
        | "perpmarginrejected" => ReasonCode::InsufficientBalance,
        "post_only_violation" | "post_only_reject" | "badalopxrejected" => {
            ReasonCode::PostOnlyViolation
        }
        "min_size" | "size_too_small" | "mintradentlrejected" | "mintradespotntlrejected" => {
            ReasonCode::MinSize
        }
        "price_out_of_bounds" | "price_too_far" | "tickrejected" | "oraclerejected" => {
            ReasonCode::PriceOutOfBounds
        }
        "rate_limited" | "too_many_requests" => ReasonCode::RateLimited,
        "network_error" | "exchange_error" | "processing_error" | "timeout"
        | "transport_error" => ReasonCode::NetworkError,
        "expired" | "ttl_expired" => ReasonCode::Expired,
        _ => ReasonCode::VenueReject,
    }
}

/// Maps a raw venue rejection string to a canonical code plus human text.
///
/// Known Hyperliquid tags get a specific explanation; everything else falls
/// back to `venue_reject` carrying the raw string so no information is lost.
///
pub fn map_raw_reason(raw: &str) -> ReasonMapping {
    let lower = raw.to_ascii_lowercase();
    if lower.is_empty() {
        return ReasonMapping {
            code: ReasonCode::VenueReject,
            text: "Order rejected".to_string(),
        };
    }
    if lower == "insufficientspotbalancerejected" || lower.contains("balance") {
        return ReasonMapping {
            code: ReasonCode::InsufficientBalance,
            text: raw.to_string(),
        };
    }
    match lower.as_str() {
        "tickrejected" | "oraclerejected" => ReasonMapping {
            code: ReasonCode::PriceOutOfBounds,
            text: "Rejected by tick/oracle constraint".to_string(),
        },
        "mintradentlrejected" | "mintradespotntlrejected" => ReasonMapping {
            code: ReasonCode::MinSize,
            text: "Order notional below minimum".to_string(),
        },
        "badalopxrejected" => ReasonMapping {
            code: ReasonCode::PostOnlyViolation,
            text: "Post-only would match immediately".to_string(),
        },
        "perpmaxpositionrejected" => ReasonMapping {
            code: ReasonCode::RiskBlocked,
            text: "Position exceeds margin tier limit".to_string(),
        },
        "perpmarginrejected" => ReasonMapping {
            code: ReasonCode::InsufficientBalance,
            text: "Insufficient margin".to_string(),
        },
        "reduceonlyrejected" => ReasonMapping {
            code: ReasonCode::InvalidParams,
            text: "Reduce-only would increase position".to_string(),
        },
        "ioccancelrejected" | "marketordernoliquidityrejected" => ReasonMapping {
            code: ReasonCode::VenueReject,
            text: "No liquidity for immediate execution".to_string(),
        },
        _ if lower.contains("openinterest") => ReasonMapping {
            code: ReasonCode::VenueReject,
            text: raw.to_string(),
        },
        _ => ReasonMapping {
            code: ReasonCode::VenueReject,
            text: raw.to_string(),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hyperliquid_tags() {
        assert_eq!(
            map_raw_reason("BadAloPxRejected").code,
            ReasonCode::PostOnlyViolation
        );
        assert_eq!(
            map_raw_reason("TickRejected").code,
            ReasonCode::PriceOutOfBounds
        );
        assert_eq!(map_raw_reason("MinTradeNtlRejected").code, ReasonCode::MinSize);
        assert_eq!(
            map_raw_reason("PerpMaxPositionRejected").code,
            ReasonCode::RiskBlocked
        );
        assert_eq!(
            map_raw_reason("PerpMarginRejected").code,
            ReasonCode::InsufficientBalance
        );
        assert_eq!(
            map_raw_reason("InsufficientSpotBalanceRejected").code,
            ReasonCode::InsufficientBalance
        );
        assert_eq!(
            map_raw_reason("ReduceOnlyRejected").code,
            ReasonCode::InvalidParams
        );
        assert_eq!(
            map_raw_reason("IocCancelRejected").code,
            ReasonCode::VenueReject
        );
    }

    #[test]
    fn test_unknown_tag_defaults_to_venue_reject() {
        let mapping = map_raw_reason("SomeBrandNewRejection");
        assert_eq!(mapping.code, ReasonCode::VenueReject);
        assert_eq!(mapping.text, "SomeBrandNewRejection");
    }

    #[test]
    fn test_canonical_code_table() {
        assert_eq!(canonical_code("ok"), ReasonCode::Ok);
        assert_eq!(canonical_code(""), ReasonCode::Ok);
        assert_eq!(canonical_code("missing_price"), ReasonCode::InvalidParams);
        assert_eq!(canonical_code("too_many_requests"), ReasonCode::RateLimited);
        assert_eq!(canonical_code("timeout"), ReasonCode::NetworkError);
        assert_eq!(canonical_code("ttl_expired"), ReasonCode::Expired);
        assert_eq!(canonical_code("no_such_code"), ReasonCode::VenueReject);
    }

    #[test]
    fn test_display_matches_wire_spelling() {
        assert_eq!(ReasonCode::PostOnlyViolation.to_string(), "post_only_violation");
        assert_eq!(ReasonCode::NetworkError.to_string(), "network_error");
    }
}
