//! Info API group: `/info`
//!
//! The `/info` endpoint serves public venue data keyed by a `type` field in
//! the request body. The connector uses two queries: `meta` (the asset
//! universe, loaded once at initialization to build trading rules and the
//! asset index map) and `l2Book` (an on-demand order book snapshot).
//!
//! Reads are idempotent, so transient transport failures and venue
//! 5xx/429 responses are retried under the group's backoff policy.
//!
use backoff::ExponentialBackoff;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::hyperliquid::connect::api::create_backoff_policy;
use crate::hyperliquid::connect::{
    client::HttpClient,
    models::{L2Book, Meta},
};
use crate::hyperliquid::error::Result;

/// The info API group.
///
pub struct Info<'c> {
    /// Reference to the HTTP client used for making API requests.
    pub client: &'c HttpClient,
    /// Backoff policy for retrying idempotent reads.
    backoff: ExponentialBackoff,
}

impl<'c> Info<'c> {
    /// Creates a new instance of `Info` with the default rate limit.
    ///
    pub fn new(client: &'c HttpClient) -> Self {
        Self {
            client,
            // Default API rate limit: 10 req/sec
            backoff: create_backoff_policy(10),
        }
    }

    /// Sets a custom backoff policy for the `Info` instance.
    ///
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetches the perpetual asset universe.
    ///
    pub async fn meta(&self) -> Result<Meta> {
        self.post_with_retry(json!({"type": "meta"})).await
    }

    /// Fetches an L2 order book snapshot for a coin.
    ///
    /// # Arguments
    ///
    /// * `coin` - Venue coin code (e.g. `"BTC"`), not a trading pair.
    ///
    pub async fn l2_book(&self, coin: &str) -> Result<L2Book> {
        self.post_with_retry(json!({"type": "l2Book", "coin": coin}))
            .await
    }

    // POSTs to `/info`, retrying transient failures under the group policy.
    async fn post_with_retry<T>(&self, body: serde_json::Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let operation = || async {
            self.client
                .post_json::<T>("/info", &body)
                .await
                .map_err(|e| {
                    if e.is_transient() {
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
        };
        backoff::future::retry(self.backoff.clone(), operation).await
    }
}
