//! API endpoint groups for the venue REST API.
//!
//! This module organizes the REST surface into two groups, mirroring the
//! venue's endpoints:
//!
//! - `info`: the public `/info` endpoint — venue metadata and L2 book
//!     snapshots. Reads are idempotent and retried under a backoff policy.
//! - `exchange`: the authenticated `/exchange` endpoint — order placement
//!     and cancellation. Writes are signed and **single-shot**: a failed
//!     placement is terminal for that order and never retried here.
//!
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

// The public `/info` endpoint: metadata and book snapshots.
mod info;
pub use info::Info;

// The authenticated `/exchange` endpoint: placement and cancellation.
mod exchange;
pub use exchange::Exchange;

/// Creates an `ExponentialBackoff` policy with a specified rate limit.
///
/// This function sets up a backoff policy to control the rate of API
/// requests, ensuring compliance with rate limits by introducing a minimum
/// interval between retry attempts.
///
/// # Arguments
///
/// * `rate_limit_per_second` - The number of allowed API requests per second.
///
fn create_backoff_policy(rate_limit_per_second: u64) -> ExponentialBackoff {
    // Minimum duration between requests
    let min_interval = Duration::from_secs_f64(1.0 / rate_limit_per_second as f64);

    ExponentialBackoffBuilder::new()
        .with_initial_interval(min_interval)
        .with_multiplier(2.0)
        .with_max_interval(Duration::from_secs(2))
        .with_max_elapsed_time(Some(Duration::from_secs(10)))
        .build()
}
