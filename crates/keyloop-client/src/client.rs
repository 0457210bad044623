//! Authenticated Keyloop HTTP client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keyloop_core::{
    BrandResponse, Credentials, CustomerResponse, DealerBackend, GatewayError, GatewayResult,
    PartResponse, PartsOrderRequest, PartsOrderResponse, PriceAvailability,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::mapping::map_response;
use crate::token::{BearerAuth, TokenProvider};
use crate::translate::UpstreamRoutes;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport settings for [`KeyloopClient`]
#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Keyloop REST API client.
///
/// Cloning is cheap; clones share the connection pool and the token cell.
#[derive(Clone)]
pub struct KeyloopClient {
    http: Client,
    routes: Arc<UpstreamRoutes>,
    auth: Arc<BearerAuth>,
}

impl KeyloopClient {
    /// Connect with default timeouts.
    ///
    /// Exchanges the client credentials for a token before returning; a
    /// failed exchange fails construction.
    pub async fn connect(credentials: Credentials) -> Result<Self> {
        Self::connect_with(credentials, ClientOptions::default()).await
    }

    /// Connect with custom transport settings
    pub async fn connect_with(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        let http = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()?;

        let routes = UpstreamRoutes::new(&credentials);
        let provider = TokenProvider::new(http.clone(), &credentials, routes.token());
        let auth = BearerAuth::acquire(provider).await?;

        info!(
            base_url = %credentials.base_url(),
            enterprise_id = credentials.enterprise_id(),
            store_id = credentials.store_id(),
            "Authenticated with Keyloop"
        );

        Ok(Self {
            http,
            routes: Arc::new(routes),
            auth: Arc::new(auth),
        })
    }

    /// Attach the bearer token, send, and map the answer
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let token = self.auth.token().await?;

        let response = request
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| GatewayError::Internal(format!("upstream request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Internal(format!("failed to read upstream body: {}", e)))?;
        debug!(status = status.as_u16(), bytes = body.len(), "Upstream answered");

        let mapped = map_response::<T>(status, &body);
        if mapped.is_unauthorized() {
            warn!("Upstream rejected bearer token; refreshing before next request");
            self.auth.invalidate(&token);
        }
        mapped.into_result()
    }
}

#[async_trait]
impl DealerBackend for KeyloopClient {
    #[instrument(skip(self))]
    async fn get_customer(&self, customer_id: &str) -> GatewayResult<CustomerResponse> {
        let url = self.routes.customer(customer_id)?;
        debug!("Fetching customer from {}", url);
        self.execute(self.http.get(url)).await
    }

    #[instrument(skip(self))]
    async fn search_parts(&self, brand_code: &str, part_code: &str) -> GatewayResult<PartResponse> {
        let url = self.routes.parts_search(brand_code, part_code)?;
        debug!("Searching parts at {}", url);
        self.execute(self.http.get(url)).await
    }

    #[instrument(skip(self))]
    async fn get_price_availability(&self, part_id: &str) -> GatewayResult<PriceAvailability> {
        let url = self.routes.price_availability(part_id)?;
        debug!("Fetching price/availability from {}", url);
        self.execute(self.http.get(url)).await
    }

    #[instrument(skip(self))]
    async fn list_brands(&self) -> GatewayResult<BrandResponse> {
        let url = self.routes.brands();
        debug!("Listing brands from {}", url);
        self.execute(self.http.get(url)).await
    }

    #[instrument(skip(self, order), fields(lines = order.line_count()))]
    async fn place_order(&self, order: &PartsOrderRequest) -> GatewayResult<PartsOrderResponse> {
        let url = self.routes.parts_orders();
        debug!("Placing parts order at {}", url);
        self.execute(self.http.post(url).json(order)).await
    }
}

impl std::fmt::Debug for KeyloopClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyloopClient")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
    }
}
