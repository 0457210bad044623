//! DealerBackend trait - the seam between request orchestration and the
//! upstream transport

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::models::{
    BrandResponse, CustomerResponse, PartResponse, PartsOrderRequest, PartsOrderResponse,
    PriceAvailability,
};

/// Upstream dealer-management operations.
///
/// Each call is a single upstream round trip whose outcome has already been
/// mapped onto [`crate::GatewayError`]. Implementations must be safe to share
/// across concurrent requests.
#[async_trait]
pub trait DealerBackend: Send + Sync {
    /// `GET v3/customers/{customer_id}`
    async fn get_customer(&self, customer_id: &str) -> GatewayResult<CustomerResponse>;

    /// `GET v1/parts?brandCode=&partCode=` (not enriched)
    async fn search_parts(&self, brand_code: &str, part_code: &str)
        -> GatewayResult<PartResponse>;

    /// `GET v1/parts/{part_id}/price-availability`
    async fn get_price_availability(&self, part_id: &str) -> GatewayResult<PriceAvailability>;

    /// `GET v1/parts/brands`
    async fn list_brands(&self) -> GatewayResult<BrandResponse>;

    /// `POST v1/parts-orders`
    async fn place_order(&self, order: &PartsOrderRequest) -> GatewayResult<PartsOrderResponse>;
}
