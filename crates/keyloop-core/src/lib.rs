//! keyloop-core - Core types for the Keyloop gateway
//!
//! This crate holds everything the transport, orchestration and HTTP layers
//! agree on: the upstream data shapes, the error taxonomy, the immutable
//! credentials, and the [`DealerBackend`] trait that separates request
//! orchestration from the upstream transport.

pub mod backend;
pub mod config;
pub mod error;
pub mod json;
pub mod models;
pub mod validate;

pub use backend::DealerBackend;
pub use config::{ConfigError, Credentials};
pub use error::{AuthError, GatewayError, GatewayResult, ProcessingError};
pub use models::*;
