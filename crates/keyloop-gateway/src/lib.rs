//! keyloop-gateway - Request orchestration for the Keyloop gateway
//!
//! [`Gateway`] validates local input, forwards it to a
//! [`keyloop_core::DealerBackend`] and, for parts search, fans out one
//! price/availability lookup per part before returning the aggregate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use keyloop_gateway::Gateway;
//!
//! let client = KeyloopClient::connect(credentials).await?;
//! let gateway = Gateway::new(Arc::new(client)).with_enrichment_concurrency(4);
//!
//! let parts = gateway.search_parts(Some("B1"), Some("123")).await?;
//! ```

pub mod enrichment;
mod gateway;

pub use enrichment::{enrich_parts, DEFAULT_ENRICHMENT_CONCURRENCY};
pub use gateway::{Gateway, Stage, NO_PARTS_FOUND};

// Re-export core types for convenience
pub use keyloop_core::{DealerBackend, GatewayError, GatewayResult};
