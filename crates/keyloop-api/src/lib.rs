//! keyloop-api - Local REST surface of the Keyloop gateway
//!
//! Thin axum handlers over [`keyloop_gateway::Gateway`]. Errors leave as
//! `{"error": <kind>, "message": <text>}` bodies; see [`ApiError`].
//!
//! # Usage
//!
//! ```ignore
//! use keyloop_api::{create_router, AppState};
//!
//! let client = KeyloopClient::connect(credentials).await?;
//! let state = AppState::from_backend(Arc::new(client));
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use std::any::Any;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the local REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Customers
        .route(
            "/api/customer/{customer_id}",
            get(handlers::customer::get_customer),
        )
        // Parts
        .route("/api/parts/search", get(handlers::parts::search_parts))
        .route("/api/parts/brands", get(handlers::parts::list_brands))
        .route("/api/parts/orders", post(handlers::parts::place_order))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(cors),
        )
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    ApiError::Internal("An unexpected error occurred.".to_string()).into_response()
}
