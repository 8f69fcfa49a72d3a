//! Static catalog data: units, staple items, reference prices, regions

use axum::{extract::Query, routing::get, Json, Router};
use kaushiru_common::catalog::{
    detect_category, units_for_category, Category, DefaultItem, LegacyCategory, ReferencePrice,
    COMMON_UNITS, DEFAULT_ITEMS, REFERENCE_PRICES,
};
use kaushiru_common::region::{BigRegion, REGION_BIG_OPTIONS};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UnitsQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetectQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /api/catalog/units?category=
///
/// Without a category the common units are returned.
pub async fn units(Query(query): Query<UnitsQuery>) -> ApiResult<Json<Vec<&'static str>>> {
    let units = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => units_for_category(raw.parse::<Category>()?),
        None => COMMON_UNITS.to_vec(),
    };
    Ok(Json(units))
}

/// GET /api/catalog/default-items
pub async fn default_items() -> Json<&'static [DefaultItem]> {
    Json(DEFAULT_ITEMS)
}

/// GET /api/catalog/reference-prices
pub async fn reference_prices() -> Json<&'static [ReferencePrice]> {
    Json(REFERENCE_PRICES)
}

/// GET /api/catalog/detect?name=
pub async fn detect(Query(query): Query<DetectQuery>) -> Json<Option<LegacyCategory>> {
    Json(detect_category(&query.name))
}

/// GET /api/regions
pub async fn regions() -> Json<&'static [BigRegion]> {
    Json(REGION_BIG_OPTIONS)
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/units", get(units))
        .route("/api/catalog/default-items", get(default_items))
        .route("/api/catalog/reference-prices", get(reference_prices))
        .route("/api/catalog/detect", get(detect))
        .route("/api/regions", get(regions))
}
