//! Client-credentials token exchange and the shared bearer-token cell

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use keyloop_core::json::{from_upstream_slice, opt_string_or_number};
use keyloop_core::{AuthError, Credentials};
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Tokens are treated as expired this long before the upstream says so
const EXPIRY_SKEW: Duration = Duration::from_secs(30);

/// Opaque bearer token with an optional expiry
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            value: value.into(),
            expires_at: expires_in.map(|d| Instant::now() + d),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// True once the expiry (minus skew) has passed. Tokens without an
    /// expiry never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() + EXPIRY_SKEW >= at,
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    expires_in: Option<String>,
}

/// Exchanges client credentials for an access token
pub struct TokenProvider {
    http: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
}

impl TokenProvider {
    pub fn new(http: Client, credentials: &Credentials, token_url: Url) -> Self {
        Self {
            http,
            token_url,
            client_id: credentials.client_id().to_string(),
            client_secret: credentials.client_secret().to_string(),
        }
    }

    /// POST the client-credentials grant and parse the token out of the answer
    #[instrument(skip(self), fields(url = %self.token_url))]
    pub async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::UpstreamRejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        let parsed: TokenResponse = from_upstream_slice(&body)
            .map_err(|e| AuthError::MalformedTokenResponse(e.to_string()))?;

        let value = match parsed.access_token {
            Some(token) if !token.trim().is_empty() => token,
            Some(_) => {
                return Err(AuthError::MalformedTokenResponse(
                    "access_token is empty".to_string(),
                ))
            }
            None => {
                return Err(AuthError::MalformedTokenResponse(
                    "access_token is missing".to_string(),
                ))
            }
        };

        let expires_in = parsed.expires_in.and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                warn!(expires_in = %raw, "Ignoring unparseable token expiry");
                None
            }
        });

        debug!(expires_in = ?expires_in, "Obtained access token");
        Ok(AccessToken::new(value, expires_in))
    }
}

/// Shared token cell.
///
/// Read on every request; written only on refresh. A refresh happens before
/// a request when the token has expired or was rejected with 401, and at
/// most one refresh runs at a time.
pub struct BearerAuth {
    provider: TokenProvider,
    current: RwLock<AccessToken>,
    stale: AtomicBool,
    refresh: tokio::sync::Mutex<()>,
}

impl BearerAuth {
    /// Acquire the first token; fails if the upstream does not issue one
    pub async fn acquire(provider: TokenProvider) -> Result<Self, AuthError> {
        let token = provider.access_token().await?;
        Ok(Self {
            provider,
            current: RwLock::new(token),
            stale: AtomicBool::new(false),
            refresh: tokio::sync::Mutex::new(()),
        })
    }

    /// Current token value, refreshed first if needed
    pub async fn token(&self) -> Result<String, AuthError> {
        if !self.needs_refresh() {
            return Ok(self.current.read().value().to_string());
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited
        if self.needs_refresh() {
            let fresh = self.provider.access_token().await?;
            *self.current.write() = fresh;
            self.stale.store(false, Ordering::Release);
            info!("Refreshed upstream access token");
        }
        Ok(self.current.read().value().to_string())
    }

    /// Mark the token stale after the upstream rejected `rejected`.
    ///
    /// Ignored if the cell already holds a different token.
    pub fn invalidate(&self, rejected: &str) {
        if self.current.read().value() == rejected {
            self.stale.store(true, Ordering::Release);
        }
    }

    fn needs_refresh(&self) -> bool {
        self.stale.load(Ordering::Acquire) || self.current.read().is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_without_expiry_never_expires() {
        assert!(!AccessToken::new("t", None).is_expired());
    }

    #[test]
    fn test_expiry_includes_skew() {
        assert!(AccessToken::new("t", Some(Duration::from_secs(10))).is_expired());
        assert!(AccessToken::new("t", Some(Duration::ZERO)).is_expired());
        assert!(!AccessToken::new("t", Some(Duration::from_secs(3600))).is_expired());
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = AccessToken::new("super-secret", None);
        assert!(!format!("{:?}", token).contains("super-secret"));
    }

    #[test]
    fn test_token_response_accepts_string_or_number_expiry() {
        let a: TokenResponse =
            from_upstream_slice(br#"{"access_token": "abc", "expires_in": "3599"}"#).unwrap();
        assert_eq!(a.access_token.as_deref(), Some("abc"));
        assert_eq!(a.expires_in.as_deref(), Some("3599"));

        let b: TokenResponse =
            from_upstream_slice(br#"{"access_token": "abc", "expires_in": 3599}"#).unwrap();
        assert_eq!(b.expires_in.as_deref(), Some("3599"));

        let c: TokenResponse = from_upstream_slice(br#"{"access_token": null}"#).unwrap();
        assert!(c.access_token.is_none());
    }
}
