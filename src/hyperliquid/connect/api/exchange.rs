//! Exchange API group: `/exchange`
//!
//! The `/exchange` endpoint accepts signed actions: order placement and
//! cancellation. The group obtains a signed envelope from the external
//! signer and POSTs it as-is — the core never interprets the signature
//! format.
//!
//! Placement is **single-shot**: there is no retry on failure. A placement
//! that dies on the wire is terminal for that order; re-submission policy
//! belongs to the strategy.
//!
use tracing::debug;

use crate::hyperliquid::connect::{
    client::HttpClient,
    models::{CancelAction, ExchangeResponse, OrderAction},
};
use crate::hyperliquid::error::Result;
use crate::hyperliquid::traits::SignL1Action;

/// The exchange API group.
///
pub struct Exchange<'c> {
    /// Reference to the HTTP client used for making API requests.
    pub client: &'c HttpClient,
    /// External signer producing signed request envelopes.
    signer: &'c dyn SignL1Action,
}

impl<'c> Exchange<'c> {
    /// Creates a new instance of `Exchange`.
    ///
    pub fn new(client: &'c HttpClient, signer: &'c dyn SignL1Action) -> Self {
        Self { client, signer }
    }

    /// Signs and submits an order action.
    ///
    /// The returned [`ExchangeResponse`] still needs per-order status
    /// inspection: a top-level `"ok"` can carry per-order `error` statuses.
    ///
    pub async fn place_order(&self, action: &OrderAction) -> Result<ExchangeResponse> {
        self.post_signed(serde_json::to_value(action)?).await
    }

    /// Signs and submits a cancel action.
    ///
    pub async fn cancel_order(&self, action: &CancelAction) -> Result<ExchangeResponse> {
        self.post_signed(serde_json::to_value(action)?).await
    }

    // Obtains the signed envelope and POSTs it, exactly once.
    async fn post_signed(&self, action: serde_json::Value) -> Result<ExchangeResponse> {
        let is_mainnet = self.client.config().is_mainnet();
        let envelope = self.signer.sign_l1_action(&action, is_mainnet)?;
        debug!(endpoint = "/exchange", "submitting signed action");
        self.client.post_json("/exchange", &envelope).await
    }
}
