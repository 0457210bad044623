//! Customer lookup handler

use axum::extract::{Path, State};
use axum::Json;
use keyloop_core::CustomerResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/customer/{customer_id}`
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state.gateway().get_customer(Some(&customer_id)).await?;
    Ok(Json(customer))
}
