//! Error types.
//!
//! This module defines the custom error types and handling mechanisms for the
//! `halyard` crate. The primary error type is `HalyardError`, which
//! consolidates all failure scenarios encountered while talking to the
//! Hyperliquid REST and WebSocket APIs, together with convenient error
//! mapping from `reqwest`, `serde_json`, `tungstenite` and `std::io`.
//!
//! # Components
//!
//! - `HalyardError`: an enumeration of all the error types that may occur.
//! - `VenueApiError`: a structure representing an HTTP-level error returned
//!     by a venue endpoint.
//! - `Result`: a custom `Result` type alias that uses `HalyardError` as the
//!     error type.
//! - `map_deserialization_error`: a utility function that logs the offending
//!     JSON before wrapping a deserialization error.
//!
use std::fmt;

/// A `Result` alias where the `Err` case is `halyard::hyperliquid::HalyardError`.
pub type Result<T> = std::result::Result<T, HalyardError>;

/// An enumeration of all possible errors that may occur when using the
/// `halyard` crate.
///
/// This enum provides a consolidated view of all error types, including those
/// originating from external crates like `reqwest` and `tungstenite`. Each
/// variant represents a specific type of error that can be encountered during
/// the operation of the connector.
///
#[derive(Debug, thiserror::Error)]
pub enum HalyardError {
    /// An HTTP-level error returned by a venue endpoint (non-2xx status).
    #[error("Hyperliquid API error: {0}")]
    VenueApiError(VenueApiError),

    /// A hard rejection carried inside an otherwise successful exchange
    /// response (`status: "err"` or a per-order `error` status). The payload
    /// is the venue's raw rejection tag, suitable for the reason mapper.
    #[error("order rejected by venue: {0}")]
    OrderRejected(String),

    /// The referenced client order id is not tracked.
    #[error("order `{0}` is not tracked")]
    OrderNotFound(String),

    /// An order with the same client order id is already tracked.
    #[error("order `{0}` is already tracked")]
    DuplicateOrder(String),

    /// The trading pair's base asset is not part of the venue universe.
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    /// Order parameters failed local validation.
    #[error("invalid order parameters: {0}")]
    InvalidOrder(String),

    /// A bounded wait elapsed without the awaited condition becoming true.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The external signer failed to produce a signed envelope.
    #[error("signer error: {0}")]
    Signer(String),

    #[error("JSON deserialization error: {0}")]
    JSONDeserialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    // Internal halyard errors
    #[error("Internal `halyard` error: {0}")]
    Internal(String),
}

impl From<&str> for HalyardError {
    fn from(value: &str) -> Self {
        HalyardError::Internal(value.to_string())
    }
}

impl HalyardError {
    /// `true` when retrying the failed request may succeed (transport
    /// failures and venue 5xx/429 responses). Used by the `/info` read path;
    /// the `/exchange` write path never retries.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            HalyardError::Reqwest(_) | HalyardError::IoError(_) => true,
            HalyardError::VenueApiError(e) => e.status_code >= 500 || e.status_code == 429,
            _ => false,
        }
    }
}

/// Represents an HTTP-level error returned by a venue endpoint.
///
/// Captures the endpoint that was accessed, the HTTP status code and the raw
/// response body for diagnostics.
///
#[derive(Debug)]
pub struct VenueApiError {
    pub endpoint: String,
    pub status_code: u16,
    pub body: String,
}

impl fmt::Display for VenueApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from `{}`: {}", self.status_code, self.endpoint, self.body)
    }
}

/// Utility function to map deserialization errors to `HalyardError` while
/// logging the JSON string that caused the error.
///
/// # Arguments
///
/// * `e` - The `serde_json::Error` that occurred during deserialization.
/// * `json_str` - The raw JSON string that caused the deserialization error.
///
pub(crate) fn map_deserialization_error(e: serde_json::Error, json_str: &str) -> HalyardError {
    tracing::error!("failed deserialization of: {}", json_str);
    HalyardError::JSONDeserialize(e)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let throttled = HalyardError::VenueApiError(VenueApiError {
            endpoint: "/info".to_string(),
            status_code: 429,
            body: "slow down".to_string(),
        });
        assert!(throttled.is_transient());

        let server_error = HalyardError::VenueApiError(VenueApiError {
            endpoint: "/info".to_string(),
            status_code: 503,
            body: "unavailable".to_string(),
        });
        assert!(server_error.is_transient());

        let rejection = HalyardError::OrderRejected("BadAloPxRejected".to_string());
        assert!(!rejection.is_transient());

        let bad_request = HalyardError::VenueApiError(VenueApiError {
            endpoint: "/exchange".to_string(),
            status_code: 400,
            body: "bad".to_string(),
        });
        assert!(!bad_request.is_transient());
    }
}
