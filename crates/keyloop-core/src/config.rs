//! Upstream credentials
//!
//! Supplied once at startup and passed by value into the client; nothing in
//! the gateway reads configuration from ambient state.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Errors raised while assembling configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field is missing or blank
    #[error("missing required configuration value: {0}")]
    MissingField(&'static str),

    /// The base URL is not an absolute URL
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Immutable Keyloop credentials and tenant identifiers
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    base_url: Url,
    client_id: String,
    client_secret: String,
    enterprise_id: String,
    store_id: String,
}

impl Credentials {
    /// Build credentials, rejecting blank fields and unparseable base URLs
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        enterprise_id: impl Into<String>,
        store_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = required("base_url", base_url.into())?;
        let client_id = required("client_id", client_id.into())?;
        let client_secret = required("client_secret", client_secret.into())?;
        let enterprise_id = required("enterprise_id", enterprise_id.into())?;
        let store_id = required("store_id", store_id.into())?;

        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: trimmed.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self {
            base_url,
            client_id,
            client_secret,
            enterprise_id,
            store_id,
        })
    }

    /// Upstream base URL (never ends with `/` unless it is the bare host)
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn enterprise_id(&self) -> &str {
        &self.enterprise_id
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("enterprise_id", &self.enterprise_id)
            .field("store_id", &self.store_id)
            .finish()
    }
}

fn required(name: &'static str, value: String) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ConfigError::MissingField(name))
    } else {
        Ok(value.to_string())
    }
}
