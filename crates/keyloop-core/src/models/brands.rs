//! Brand catalogue (`v1/parts/brands`)

use serde::{Deserialize, Serialize};

use super::Link;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandResponse {
    #[serde(default)]
    pub brands: Vec<Brand>,
    #[serde(default)]
    pub total_items: i64,
    #[serde(default)]
    pub total_pages: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}
