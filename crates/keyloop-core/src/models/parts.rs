//! Parts search and price/availability records (`v1/parts`)

use serde::{Deserialize, Serialize};

use super::{Link, Price};
use crate::json::opt_string_or_number;

/// Aggregate returned by a parts search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartResponse {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub total_items: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// A single part; `price` and `availability` are filled in by enrichment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub part_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_parts: Option<Vec<Part>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<i64>,
}

impl Part {
    /// Overwrite price and availability from a lookup result.
    ///
    /// Only applies when both the list net value and the available stock
    /// are present; returns `false` and leaves the part untouched otherwise.
    pub fn apply_price_availability(&mut self, pa: &PriceAvailability) -> bool {
        let net_value = pa.list_price.as_ref().and_then(|p| p.net_value);
        match (net_value, pa.available_stock) {
            (Some(price), Some(stock)) => {
                self.price = Some(price);
                self.availability = Some(stock);
                true
            }
            _ => false,
        }
    }
}

/// Live price and stock for one part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAvailability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub part_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_blocked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_blocked_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available_for_back_order: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_in_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_vehicle_references: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_prices: Option<serde_json::Value>,
}
