//! Gateway - orchestrates one local request against the dealer backend
//!
//! Each operation walks the same stages: validate the local input, call the
//! upstream through the [`DealerBackend`], and for parts search enrich the
//! result with live price and stock. Every transition is traced at `debug`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use keyloop_core::validate::{require, require_order_lines};
use keyloop_core::{
    BrandResponse, CustomerResponse, DealerBackend, GatewayError, GatewayResult, PartResponse,
    PartsOrderRequest, PartsOrderResponse,
};
use tracing::{debug, info};

use crate::enrichment::{enrich_parts, DEFAULT_ENRICHMENT_CONCURRENCY};

/// Message returned when a parts search finds nothing and the upstream gave no reason
pub const NO_PARTS_FOUND: &str = "No parts found.";

/// Request lifecycle stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    CallingUpstream,
    Enriching,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::CallingUpstream => "calling_upstream",
            Stage::Enriching => "enriching",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(operation: &'static str, stage: Stage) {
    debug!(operation, stage = %stage, "Request stage");
}

/// Orchestrates local requests against a single dealer backend
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn DealerBackend>,
    enrichment_concurrency: usize,
}

impl Gateway {
    pub fn new(backend: Arc<dyn DealerBackend>) -> Self {
        Self {
            backend,
            enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
        }
    }

    /// Limit concurrent price/availability lookups (values below 1 become 1)
    pub fn with_enrichment_concurrency(mut self, limit: usize) -> Self {
        self.enrichment_concurrency = limit.max(1);
        self
    }

    pub fn enrichment_concurrency(&self) -> usize {
        self.enrichment_concurrency
    }

    /// Fetch one customer record
    pub async fn get_customer(&self, customer_id: Option<&str>) -> GatewayResult<CustomerResponse> {
        const OP: &str = "get_customer";
        traced(OP, async {
            enter(OP, Stage::Validating);
            let customer_id = require("customerId", customer_id)?;

            enter(OP, Stage::CallingUpstream);
            match self.backend.get_customer(customer_id).await {
                Err(GatewayError::NotFound(message)) => {
                    info!(customer_id, "Customer not found");
                    Err(GatewayError::NotFound(message))
                }
                other => other,
            }
        })
        .await
    }

    /// Search parts by brand and part code, then enrich every hit with
    /// price and availability.
    ///
    /// Any failed lookup fails the whole search.
    pub async fn search_parts(
        &self,
        brand_code: Option<&str>,
        part_code: Option<&str>,
    ) -> GatewayResult<PartResponse> {
        const OP: &str = "search_parts";
        traced(OP, async {
            enter(OP, Stage::Validating);
            let brand_code = require("brandCode", brand_code)?;
            let part_code = require("partCode", part_code)?;

            enter(OP, Stage::CallingUpstream);
            let mut result = match self.backend.search_parts(brand_code, part_code).await {
                Err(GatewayError::NotFound(None)) => {
                    return Err(GatewayError::NotFound(Some(NO_PARTS_FOUND.to_string())))
                }
                other => other?,
            };

            if !result.parts.is_empty() {
                enter(OP, Stage::Enriching);
                enrich_parts(
                    self.backend.as_ref(),
                    &mut result,
                    self.enrichment_concurrency,
                )
                .await?;
            }
            Ok(result)
        })
        .await
    }

    /// List the brand catalogue
    pub async fn list_brands(&self) -> GatewayResult<BrandResponse> {
        const OP: &str = "list_brands";
        traced(OP, async {
            enter(OP, Stage::CallingUpstream);
            self.backend.list_brands().await
        })
        .await
    }

    /// Validate and forward a parts order
    pub async fn place_order(&self, order: &PartsOrderRequest) -> GatewayResult<PartsOrderResponse> {
        const OP: &str = "place_order";
        traced(OP, async {
            enter(OP, Stage::Validating);
            require_order_lines(order)?;

            enter(OP, Stage::CallingUpstream);
            self.backend.place_order(order).await
        })
        .await
    }
}

async fn traced<T>(
    operation: &'static str,
    work: impl Future<Output = GatewayResult<T>>,
) -> GatewayResult<T> {
    let result = work.await;
    match &result {
        Ok(_) => enter(operation, Stage::Done),
        Err(e) => debug!(operation, stage = %Stage::Failed, error = %e, "Request stage"),
    }
    result
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("enrichment_concurrency", &self.enrichment_concurrency)
            .finish_non_exhaustive()
    }
}
