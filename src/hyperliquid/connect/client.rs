//! Asynchronous HTTP client.
//!
//! A thin wrapper over `reqwest::Client` carrying the connector
//! configuration. All venue REST interaction is JSON-over-POST; this client
//! centralizes URL construction, HTTP status handling and response
//! deserialization. API groups ([`Info`](crate::hyperliquid::connect::api::Info),
//! [`Exchange`](crate::hyperliquid::connect::api::Exchange)) borrow it and
//! add their own retry policies on top.
//!
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::hyperliquid::connect::config::Config;
use crate::hyperliquid::error::{map_deserialization_error, HalyardError, Result, VenueApiError};

/// An asynchronous HTTP client for the venue REST API.
///
/// `HttpClient` wraps a `reqwest::Client`, which holds a connection pool
/// internally. It is advisable to create one and **reuse** it; cloning is
/// cheap because the inner client is reference-counted.
///
#[derive(Clone)]
pub struct HttpClient {
    /// A reqwest client instance.
    client: reqwest::Client,
    /// Connector configuration.
    config: Config,
}

impl HttpClient {
    /// Constructs an `HttpClient` from a configuration.
    ///
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// POSTs a JSON body to a venue endpoint and deserializes the JSON
    /// response.
    ///
    /// # Arguments
    ///
    /// * `path` - Endpoint path with a leading slash (e.g. `"/info"`).
    /// * `body` - JSON request body.
    ///
    /// # Errors
    ///
    /// Non-2xx responses become [`HalyardError::VenueApiError`] carrying the
    /// status code and raw body; malformed JSON becomes
    /// [`HalyardError::JSONDeserialize`] after the offending payload is
    /// logged.
    ///
    pub async fn post_json<T>(&self, path: &str, body: &serde_json::Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.config.rest_url(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(HalyardError::VenueApiError(VenueApiError {
                endpoint: path.to_string(),
                status_code: status.as_u16(),
                body: text,
            }));
        }
        serde_json::from_str::<T>(&text).map_err(|e| map_deserialization_error(e, &text))
    }
}
