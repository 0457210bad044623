//! Application state for the Keyloop API

use std::sync::Arc;

use keyloop_core::DealerBackend;
use keyloop_gateway::Gateway;

/// Application state shared across all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    gateway: Gateway,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// State over a backend with default enrichment settings
    pub fn from_backend(backend: Arc<dyn DealerBackend>) -> Self {
        Self::new(Gateway::new(backend))
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}
