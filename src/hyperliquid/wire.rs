//! Wire-format helpers used across the connector.
//!
//! Hyperliquid expects prices and sizes as plain decimal strings (no
//! scientific notation, no trailing zeros) with a per-asset bound on
//! post-decimal digits and at most five significant figures on prices,
//! coins as bare base-asset codes (`BTC`, not `BTC-USD`), and client order
//! ids (`cloid`) as `0x`-prefixed 128-bit hex strings. The helpers in this
//! module perform those conversions.
//!
use sha2::{Digest, Sha256};

/// Formats a value as a fixed-point decimal string with at most
/// `max_decimals` digits after the point, trimming trailing zeros.
///
/// Never produces scientific notation; non-finite inputs collapse to `"0"`.
///
/// # Arguments
///
/// * `value` - The value to format.
/// * `max_decimals` - Maximum number of post-decimal digits.
///
/// # Example
///
/// ```ignore
/// assert_eq!(format_decimal(2500.13, 5), "2500.13");
/// ```
///
pub fn format_decimal(value: f64, max_decimals: u32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", max_decimals as usize, value);
    trim_trailing_zeros(fixed)
}

/// Rounds a value to at most `max_sig_figs` significant digits.
///
/// `60123.45` at five significant figures becomes `60123.0`; `123456.0`
/// becomes `123460.0`. Non-finite and zero inputs are returned unchanged;
/// a cap of zero is treated as one.
///
pub fn round_to_significant_digits(value: f64, max_sig_figs: u32) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    let figs = max_sig_figs.max(1) as i32;
    let exponent = value.abs().log10().floor() as i32;
    let decimals = figs - 1 - exponent;
    // Keep the scale a positive power of ten on the rounding side: those
    // are exactly representable, negative powers are not.
    if decimals >= 0 {
        let scale = 10f64.powi(decimals);
        (value * scale).round() / scale
    } else {
        let scale = 10f64.powi(-decimals);
        (value / scale).round() * scale
    }
}

/// Formats a value with at most `max_sig_figs` significant digits as a
/// plain decimal string, trimming trailing zeros.
///
/// This is the venue's price contract: at most N significant digits
/// (N = 5 by default for perpetuals), never scientific notation.
///
/// # Example
///
/// ```ignore
/// assert_eq!(to_significant_digits(60123.45, 5), "60123");
/// assert_eq!(to_significant_digits(2500.12678, 5), "2500.1");
/// ```
///
pub fn to_significant_digits(value: f64, max_sig_figs: u32) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    let figs = max_sig_figs.max(1) as i32;
    let rounded = round_to_significant_digits(value, max_sig_figs);
    // Recompute from the rounded value: rounding can carry into the next
    // power of ten (9.9999 -> 10).
    let exponent = rounded.abs().log10().floor() as i32;
    let decimals = (figs - 1 - exponent).max(0) as u32;
    format_decimal(rounded, decimals)
}

/// Removes trailing zeros (and a dangling decimal point) from a fixed-point
/// decimal string.
///
pub fn trim_trailing_zeros(mut value: String) -> String {
    if value.contains('.') {
        while value.ends_with('0') {
            value.pop();
        }
        if value.ends_with('.') {
            value.pop();
        }
    }
    if value.is_empty() {
        return "0".to_string();
    }
    value
}

/// Extracts the base asset (the venue "coin") from a `BASE-QUOTE` pair.
///
/// `"BTC-USD"` becomes `"BTC"`; a string without a hyphen is returned
/// unchanged.
///
pub fn extract_coin(trading_pair: &str) -> &str {
    match trading_pair.find('-') {
        Some(pos) => &trading_pair[..pos],
        None => trading_pair,
    }
}

/// Builds the canonical `BASE-QUOTE` trading pair for a venue coin.
///
/// Hyperliquid perpetuals are all quoted in USD.
///
pub fn coin_to_trading_pair(coin: &str) -> String {
    format!("{}-USD", coin.to_ascii_uppercase())
}

/// Normalizes an externally supplied symbol to the canonical `BASE-QUOTE`
/// form.
///
/// Accepts `BASE/QUOTE`, `BASE/QUOTE:SETTLE`, `BASE-QUOTE` and
/// `BASE-QUOTE-PERP` spellings, uppercases the result and strips settle and
/// `-PERP` suffixes. The operation is idempotent: normalizing an already
/// normalized pair returns it unchanged.
///
pub fn normalize_trading_pair(symbol: &str) -> String {
    let mut s = symbol.trim().to_ascii_uppercase();
    // Drop a ccxt-style settle suffix (ETH/USDT:USDT).
    if let Some(colon) = s.find(':') {
        s.truncate(colon);
    }
    let s = s.replace('/', "-");
    match s.strip_suffix("-PERP") {
        Some(stripped) => stripped.to_string(),
        None => s,
    }
}

/// Length of a wire `cloid` payload: 128 bits as hex.
const CLOID_HEX_LEN: usize = 32;

/// Derives a deterministic wire `cloid` from a client order id.
///
/// The venue requires `0x` followed by exactly 32 hex characters (128 bits).
/// The payload is the first 16 bytes of the SHA-256 digest of the client
/// order id, so the same client order id always maps to the same `cloid`
/// across processes.
///
pub fn derive_cloid(client_order_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_order_id.as_bytes());
    let digest = hasher.finalize();
    format!("0x{}", hex::encode(&digest[..CLOID_HEX_LEN / 2]))
}

/// Checks that a user-supplied `cloid` matches the venue's required format:
/// `0x` followed by exactly 32 hex characters.
///
pub fn is_valid_cloid(cloid: &str) -> bool {
    match cloid.strip_prefix("0x") {
        Some(body) => body.len() == CLOID_HEX_LEN && body.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(2500.13, 5), "2500.13");
        assert_eq!(format_decimal(2500.0, 5), "2500");
        assert_eq!(format_decimal(0.123, 3), "0.123");
        assert_eq!(format_decimal(0.1230, 4), "0.123");
        assert_eq!(format_decimal(1_000_000.0, 5), "1000000");
        assert_eq!(format_decimal(f64::NAN, 5), "0");
        assert_eq!(format_decimal(f64::INFINITY, 5), "0");
    }

    #[test]
    fn test_round_to_significant_digits() {
        assert_eq!(round_to_significant_digits(60123.45, 5), 60123.0);
        assert_eq!(round_to_significant_digits(123456.0, 5), 123460.0);
        assert!((round_to_significant_digits(2500.12678, 5) - 2500.1).abs() < 1e-9);
        assert!((round_to_significant_digits(0.000123456, 5) - 0.00012346).abs() < 1e-15);
        assert_eq!(round_to_significant_digits(0.0, 5), 0.0);
        assert!(round_to_significant_digits(f64::NAN, 5).is_nan());
    }

    #[test]
    fn test_to_significant_digits() {
        // prices with five or more integer digits collapse to an integer
        assert_eq!(to_significant_digits(60123.45, 5), "60123");
        assert_eq!(to_significant_digits(123456.0, 5), "123460");
        assert_eq!(to_significant_digits(2500.12678, 5), "2500.1");
        assert_eq!(to_significant_digits(0.000123456, 5), "0.00012346");
        // rounding may carry into the next power of ten
        assert_eq!(to_significant_digits(9.99996, 5), "10");
        assert_eq!(to_significant_digits(-60123.45, 5), "-60123");
        assert_eq!(to_significant_digits(0.0, 5), "0");
        assert_eq!(to_significant_digits(f64::INFINITY, 5), "0");
    }

    #[test]
    fn test_trim_trailing_zeros() {
        assert_eq!(trim_trailing_zeros("1.2300".to_string()), "1.23");
        assert_eq!(trim_trailing_zeros("1.000".to_string()), "1");
        assert_eq!(trim_trailing_zeros("42".to_string()), "42");
        assert_eq!(trim_trailing_zeros("0.0".to_string()), "0");
    }

    #[test]
    fn test_symbol_helpers() {
        assert_eq!(extract_coin("BTC-USD"), "BTC");
        assert_eq!(extract_coin("BTC"), "BTC");
        assert_eq!(coin_to_trading_pair("eth"), "ETH-USD");
    }

    #[test]
    fn test_normalize_trading_pair() {
        assert_eq!(normalize_trading_pair("eth/usd"), "ETH-USD");
        assert_eq!(normalize_trading_pair("ETH/USDT:USDT"), "ETH-USDT");
        assert_eq!(normalize_trading_pair("BTC-USD-PERP"), "BTC-USD");
        // Idempotence
        let once = normalize_trading_pair("btc/usd");
        assert_eq!(normalize_trading_pair(&once), once);
    }

    #[test]
    fn test_derive_cloid_format_and_determinism() {
        let a = derive_cloid("hal-1718000000000-1");
        let b = derive_cloid("hal-1718000000000-1");
        let c = derive_cloid("hal-1718000000000-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(is_valid_cloid(&a));
        assert_eq!(a.len(), 2 + 32);
    }

    #[test]
    fn test_is_valid_cloid() {
        assert!(is_valid_cloid("0x0123456789abcdef0123456789abcdef"));
        assert!(!is_valid_cloid("0123456789abcdef0123456789abcdef"));
        assert!(!is_valid_cloid("0x0123"));
        assert!(!is_valid_cloid("0xzz23456789abcdef0123456789abcdef"));
    }
}
