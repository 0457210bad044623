//! Keyloop Client Library
//!
//! Authenticated HTTP client for the Keyloop dealer-management API. The
//! client exchanges its credentials for a bearer token once at
//! construction, injects it on every call, and maps each upstream answer
//! onto [`keyloop_core::GatewayError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use keyloop_client::KeyloopClient;
//! use keyloop_core::{Credentials, DealerBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let credentials = Credentials::new(
//!         "https://api.eu-stage.keyloop.io",
//!         "client-id",
//!         "client-secret",
//!         "enterprise",
//!         "store",
//!     )?;
//!     let client = KeyloopClient::connect(credentials).await?;
//!
//!     let brands = client.list_brands().await?;
//!     println!("{} brands", brands.brands.len());
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides [`testing::MockUpstream`], a scripted fake
//! of the upstream served through [`testing::TestServer`]:
//!
//! ```rust,ignore
//! let mock = MockUpstream::new();
//! mock.on_get("/ent/store/v1/parts/brands", CannedResponse::json(200, json!({"brands": []})));
//! let server = mock.start().await?;
//! let client = KeyloopClient::connect(server.credentials()?).await?;
//! ```

mod client;
mod error;
pub mod mapping;
pub mod testing;
pub mod token;
pub mod translate;

pub use client::{ClientOptions, KeyloopClient};
pub use error::{ClientError, Result};
pub use mapping::{map_response, Mapped};
pub use translate::UpstreamRoutes;
