//! Configuration for the asynchronous HTTP and WebSocket clients.
//!
//! This module provides endpoint configuration for the connector, including
//! default mainnet/testnet URLs, environment variable handling, and the
//! client order id prefix.
//!
//! # Environment variables:
//!
//! The following environment variables can be specified to override the
//! default values:
//!
//! - `HYPERLIQUID_API_BASE`: The base URL for the Hyperliquid REST API.
//! - `HYPERLIQUID_WS_BASE`: The URL for the Hyperliquid WebSocket API.
//!
use crate::hyperliquid::connect::credentials::AccountCredentials;

/// Default mainnet REST API base url.
///
pub const HYPERLIQUID_API_BASE: &str = "https://api.hyperliquid.xyz";

/// Default testnet REST API base url.
///
pub const HYPERLIQUID_TESTNET_API_BASE: &str = "https://api.hyperliquid-testnet.xyz";

/// Default mainnet WebSocket url.
///
pub const HYPERLIQUID_WS_BASE: &str = "wss://api.hyperliquid.xyz/ws";

/// Default testnet WebSocket url.
///
pub const HYPERLIQUID_TESTNET_WS_BASE: &str = "wss://api.hyperliquid-testnet.xyz/ws";

/// Default prefix for generated client order ids.
///
pub const DEFAULT_CLIENT_ORDER_ID_PREFIX: &str = "hal";

/// Represents the connector client configuration.
///
/// This struct holds the REST base URL, the WebSocket URL, the network flag
/// and the account credentials.
///
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL for the REST API.
    api_base: String,
    /// URL for the WebSocket API.
    ws_base: String,
    /// Whether this configuration targets the testnet.
    testnet: bool,
    /// Prefix for generated client order ids.
    client_order_id_prefix: String,
    /// Account credentials for the private stream.
    credentials: AccountCredentials,
}

impl Config {
    /// Mainnet configuration; URLs are picked up from environment variables
    /// and fall back to the defaults.
    ///
    pub fn mainnet(credentials: AccountCredentials) -> Self {
        Self {
            api_base: std::env::var("HYPERLIQUID_API_BASE")
                .unwrap_or_else(|_| HYPERLIQUID_API_BASE.to_string()),
            ws_base: std::env::var("HYPERLIQUID_WS_BASE")
                .unwrap_or_else(|_| HYPERLIQUID_WS_BASE.to_string()),
            testnet: false,
            client_order_id_prefix: DEFAULT_CLIENT_ORDER_ID_PREFIX.to_string(),
            credentials,
        }
    }

    /// Testnet configuration; URLs are picked up from environment variables
    /// and fall back to the testnet defaults.
    ///
    pub fn testnet(credentials: AccountCredentials) -> Self {
        Self {
            api_base: std::env::var("HYPERLIQUID_API_BASE")
                .unwrap_or_else(|_| HYPERLIQUID_TESTNET_API_BASE.to_string()),
            ws_base: std::env::var("HYPERLIQUID_WS_BASE")
                .unwrap_or_else(|_| HYPERLIQUID_TESTNET_WS_BASE.to_string()),
            testnet: true,
            client_order_id_prefix: DEFAULT_CLIENT_ORDER_ID_PREFIX.to_string(),
            credentials,
        }
    }

    /// Constructs a `Config` from individual parts.
    ///
    /// # Arguments
    ///
    /// * `api_base` - The base URL for the REST API.
    /// * `ws_base` - The URL for the WebSocket API.
    /// * `testnet` - Whether the endpoints belong to the testnet.
    /// * `credentials` - The account credentials.
    ///
    pub fn from_parts<InS>(
        api_base: InS,
        ws_base: InS,
        testnet: bool,
        credentials: AccountCredentials,
    ) -> Self
    where
        InS: Into<String>,
    {
        Self {
            api_base: api_base.into(),
            ws_base: ws_base.into(),
            testnet,
            client_order_id_prefix: DEFAULT_CLIENT_ORDER_ID_PREFIX.to_string(),
            credentials,
        }
    }

    /// Overrides the client order id prefix.
    pub fn with_client_order_id_prefix<InS>(mut self, prefix: InS) -> Self
    where
        InS: Into<String>,
    {
        self.client_order_id_prefix = prefix.into();
        self
    }

    /// Constructs a REST URL endpoint given a path.
    ///
    /// NOTE: The `path` should have a leading slash.
    ///
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Returns the WebSocket URL.
    pub fn ws_url(&self) -> &str {
        self.ws_base.as_str()
    }

    /// Returns the REST base URL.
    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// `true` when this configuration targets mainnet.
    pub fn is_mainnet(&self) -> bool {
        !self.testnet
    }

    /// `true` when this configuration targets the testnet.
    pub fn is_testnet(&self) -> bool {
        self.testnet
    }

    /// Returns the client order id prefix.
    pub fn client_order_id_prefix(&self) -> &str {
        self.client_order_id_prefix.as_str()
    }

    /// Returns the account credentials.
    pub fn credentials(&self) -> &AccountCredentials {
        &self.credentials
    }
}
