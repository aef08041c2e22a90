//! Account credential type for the private stream.
//!
//! Signing key material never enters this crate — request signing lives
//! behind the [`SignL1Action`](crate::hyperliquid::traits::SignL1Action)
//! seam. What the connector does need is the account (wallet or vault)
//! address, used to subscribe to per-account order, fill and position
//! channels on the private WebSocket.
//!
//! # Environment variables:
//!
//! - `HYPERLIQUID_ACCOUNT_ADDRESS`: the `0x`-prefixed account address.
//!
use secrecy::Secret;

/// Represents the account identity used on the private stream.
///
/// The address is held behind [`Secret`] so it is redacted from `Debug`
/// output and zeroed in memory when dropped.
///
#[derive(Clone, Debug)]
pub struct AccountCredentials {
    address: Secret<String>,
}

impl Default for AccountCredentials {
    /// Creates `AccountCredentials` using values from environment variables.
    ///
    /// If the environment variable is not set, the address will be an empty
    /// string.
    ///
    fn default() -> Self {
        Self::load_from_env()
    }
}

impl AccountCredentials {
    /// Creates `AccountCredentials` from an explicit address.
    ///
    /// Intended to be used from a custom credentials provider. It is
    /// __NOT__ safe to hardcode account identities in your application.
    ///
    pub fn new<InS>(address: InS) -> Self
    where
        InS: Into<String>,
    {
        Self {
            address: Secret::new(address.into()),
        }
    }

    /// Loads credentials from environment variables.
    ///
    pub fn load_from_env() -> Self {
        Self {
            address: std::env::var("HYPERLIQUID_ACCOUNT_ADDRESS")
                .unwrap_or_else(|_| "".to_string())
                .into(),
        }
    }

    /// Returns the account address.
    ///
    pub fn address(&self) -> Secret<String> {
        self.address.clone()
    }
}

#[cfg(test)]
mod test {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_explicit_credentials() {
        let creds = AccountCredentials::new("0xfeedface");
        assert_eq!(creds.address().expose_secret(), "0xfeedface");
    }

    #[test]
    fn test_debug_redacts_address() {
        let creds = AccountCredentials::new("0xfeedface");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("0xfeedface"));
    }
}
