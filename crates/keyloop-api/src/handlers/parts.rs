//! Parts search, brand catalogue and order handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use keyloop_core::json::normalize_keys;
use keyloop_core::{BrandResponse, PartResponse, PartsOrderRequest, PartsOrderResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Query for `GET /api/parts/search`; both fields are required but checked
/// by the gateway so that a missing one is a validation error, not a
/// rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartSearchQuery {
    pub brand_code: Option<String>,
    pub part_code: Option<String>,
}

/// `GET /api/parts/search?brandCode=&partCode=`
pub async fn search_parts(
    State(state): State<AppState>,
    query: Result<Query<PartSearchQuery>, QueryRejection>,
) -> Result<Json<PartResponse>, ApiError> {
    let Query(query) = query?;
    let parts = state
        .gateway()
        .search_parts(query.brand_code.as_deref(), query.part_code.as_deref())
        .await?;
    Ok(Json(parts))
}

/// `GET /api/parts/brands`
pub async fn list_brands(State(state): State<AppState>) -> Result<Json<BrandResponse>, ApiError> {
    let brands = state.gateway().list_brands().await?;
    Ok(Json(brands))
}

/// `POST /api/parts/orders`
///
/// Field names in the body are matched without regard to case.
pub async fn place_order(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<PartsOrderResponse>, ApiError> {
    let Json(raw) = payload?;
    let order: PartsOrderRequest = serde_json::from_value(normalize_keys(raw))
        .map_err(|e| ApiError::BadRequest(format!("Invalid order: {}", e)))?;

    let confirmation = state.gateway().place_order(&order).await?;
    Ok(Json(confirmation))
}
