//! Price/availability enrichment for parts search results
//!
//! One lookup per part, run concurrently up to a limit. Results are merged
//! back by position, so completion order never matters. The first failed
//! lookup fails the whole search and drops the lookups still in flight.

use futures::stream::{self, StreamExt, TryStreamExt};
use keyloop_core::{DealerBackend, GatewayResult, PartResponse, PriceAvailability, ProcessingError};
use tracing::{debug, warn};

/// Default number of concurrent price/availability lookups
pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 8;

/// Fill in `price` and `availability` on every part in `response`.
///
/// Parts whose lookup lacks a net list price or a stock figure are left
/// unchanged. On error `response` is untouched.
pub async fn enrich_parts(
    backend: &dyn DealerBackend,
    response: &mut PartResponse,
    concurrency: usize,
) -> GatewayResult<()> {
    let limit = concurrency.max(1);
    debug!(parts = response.parts.len(), limit, "Enriching parts");

    let part_ids: Vec<(usize, Option<String>)> = response
        .parts
        .iter()
        .enumerate()
        .map(|(index, part)| (index, part.part_id.clone()))
        .collect();
    let lookups = part_ids
        .into_iter()
        .map(|(index, part_id)| lookup(backend, index, part_id));

    let results: Vec<(usize, String, PriceAvailability)> = stream::iter(lookups)
        .buffer_unordered(limit)
        .try_collect()
        .await?;

    for (index, part_id, price_availability) in results {
        if let Some(echoed) = price_availability.part_id.as_deref() {
            if echoed != part_id {
                warn!(part_id = %part_id, echoed = %echoed, "Lookup answered for a different partId");
            }
        }

        let part = &mut response.parts[index];
        if !part.apply_price_availability(&price_availability) {
            warn!(part_id = %part_id, "Incomplete price/availability; part left unchanged");
        }
    }

    Ok(())
}

async fn lookup(
    backend: &dyn DealerBackend,
    index: usize,
    part_id: Option<String>,
) -> Result<(usize, String, PriceAvailability), ProcessingError> {
    let part_id = match part_id.map(|id| id.trim().to_string()) {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(ProcessingError::EnrichmentFailed {
                part_id: format!("<position {}>", index),
                reason: "part has no partId".to_string(),
            })
        }
    };

    match backend.get_price_availability(&part_id).await {
        Ok(price_availability) => Ok((index, part_id, price_availability)),
        Err(e) => Err(ProcessingError::EnrichmentFailed {
            part_id,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use keyloop_core::{
        BrandResponse, CustomerResponse, GatewayError, Part, PartsOrderRequest,
        PartsOrderResponse, Price,
    };

    use super::*;

    /// Answers lookups from a table; unknown ids are upstream 500s
    #[derive(Default)]
    struct LookupTable {
        answers: HashMap<String, (PriceAvailability, Duration)>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl LookupTable {
        fn answer(mut self, part_id: &str, net: Option<f64>, stock: Option<i64>, delay_ms: u64) -> Self {
            let pa = PriceAvailability {
                part_id: Some(part_id.to_string()),
                list_price: Some(Price {
                    net_value: net,
                    ..Default::default()
                }),
                available_stock: stock,
                ..Default::default()
            };
            self.answers
                .insert(part_id.to_string(), (pa, Duration::from_millis(delay_ms)));
            self
        }
    }

    #[async_trait]
    impl DealerBackend for LookupTable {
        async fn get_customer(&self, _: &str) -> GatewayResult<CustomerResponse> {
            unimplemented!()
        }
        async fn search_parts(&self, _: &str, _: &str) -> GatewayResult<PartResponse> {
            unimplemented!()
        }
        async fn get_price_availability(&self, part_id: &str) -> GatewayResult<PriceAvailability> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let answer = self.answers.get(part_id).cloned();
            let delay = answer.as_ref().map_or(Duration::ZERO, |(_, d)| *d);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            answer
                .map(|(pa, _)| pa)
                .ok_or_else(|| GatewayError::upstream(500, "lookup failed"))
        }
        async fn list_brands(&self) -> GatewayResult<BrandResponse> {
            unimplemented!()
        }
        async fn place_order(&self, _: &PartsOrderRequest) -> GatewayResult<PartsOrderResponse> {
            unimplemented!()
        }
    }

    fn parts(ids: &[&str]) -> PartResponse {
        PartResponse {
            parts: ids
                .iter()
                .map(|id| Part {
                    part_id: Some(id.to_string()),
                    ..Default::default()
                })
                .collect(),
            total_items: ids.len() as i64,
            total_pages: 1,
            links: vec![],
        }
    }

    #[tokio::test]
    async fn test_results_merge_by_position_not_completion() {
        // First part answers last
        let backend = LookupTable::default()
            .answer("P1", Some(1.0), Some(10), 40)
            .answer("P2", Some(2.0), Some(20), 0)
            .answer("P3", Some(3.0), Some(30), 20);
        let mut response = parts(&["P1", "P2", "P3"]);

        enrich_parts(&backend, &mut response, 8).await.unwrap();

        let merged: Vec<_> = response
            .parts
            .iter()
            .map(|p| (p.part_id.clone().unwrap(), p.price, p.availability))
            .collect();
        assert_eq!(
            merged,
            vec![
                ("P1".to_string(), Some(1.0), Some(10)),
                ("P2".to_string(), Some(2.0), Some(20)),
                ("P3".to_string(), Some(3.0), Some(30)),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let ids: Vec<String> = (0..6).map(|i| format!("P{}", i)).collect();
        let mut backend = LookupTable::default();
        for id in &ids {
            backend = backend.answer(id, Some(1.0), Some(1), 20);
        }
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let mut response = parts(&id_refs);
        enrich_parts(&backend, &mut response, 2).await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
        assert!(backend.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs_sequentially() {
        let backend = LookupTable::default()
            .answer("P1", Some(1.0), Some(1), 0)
            .answer("P2", Some(2.0), Some(2), 0);
        let mut response = parts(&["P1", "P2"]);
        enrich_parts(&backend, &mut response, 0).await.unwrap();
        assert_eq!(backend.peak.load(Ordering::SeqCst), 1);
        assert_eq!(response.parts[1].price, Some(2.0));
    }

    #[tokio::test]
    async fn test_incomplete_lookup_leaves_part_unchanged() {
        let backend = LookupTable::default()
            .answer("P1", None, Some(5), 0)
            .answer("P2", Some(7.5), None, 0);
        let mut response = parts(&["P1", "P2"]);
        response.parts[0].price = Some(99.0);

        enrich_parts(&backend, &mut response, 8).await.unwrap();
        assert_eq!(response.parts[0].price, Some(99.0));
        assert_eq!(response.parts[0].availability, None);
        assert_eq!(response.parts[1].price, None);
        assert_eq!(response.parts[1].availability, None);
    }

    #[tokio::test]
    async fn test_single_failure_fails_everything() {
        let backend = LookupTable::default()
            .answer("P1", Some(1.0), Some(1), 0)
            .answer("P3", Some(3.0), Some(3), 0);
        let mut response = parts(&["P1", "BROKEN", "P3"]);
        let before = response.clone();

        let err = enrich_parts(&backend, &mut response, 8).await.unwrap_err();
        match err {
            GatewayError::Processing(ProcessingError::EnrichmentFailed { part_id, reason }) => {
                assert_eq!(part_id, "BROKEN");
                assert!(reason.contains("500"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(response, before);
    }

    #[tokio::test]
    async fn test_part_without_id_fails() {
        let backend = LookupTable::default().answer("P1", Some(1.0), Some(1), 0);
        let mut response = parts(&["P1"]);
        response.parts.push(Part::default());

        let err = enrich_parts(&backend, &mut response, 8).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Processing(ProcessingError::EnrichmentFailed { .. })
        ));
    }
}
