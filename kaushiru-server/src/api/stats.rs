//! Aggregated price statistics
//!
//! Every request re-reads the window and re-aggregates; nothing is cached.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use kaushiru_common::aggregate::{
    category_stats, find_item, item_stats, price_trends, CategoryStats, CategoryTrend, ItemStats,
};
use kaushiru_common::catalog::{DefaultItem, DEFAULT_ITEMS};
use kaushiru_common::region::RegionSelection;
use kaushiru_common::time::{now, window_start};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::RegionQuery;
use crate::error::{ApiError, ApiResult};
use crate::store::posts::{observations_since, ObservationScope};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    #[serde(flatten)]
    pub region: RegionQuery,
    /// Case-insensitive substring of the item name
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemDetailQuery {
    #[serde(flatten)]
    pub region: RegionQuery,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// A staple item with its statistics, if any were posted
#[derive(Debug, Serialize)]
pub struct DefaultItemStats {
    #[serde(flatten)]
    pub item: DefaultItem,
    pub stats: Option<ItemStats>,
}

async fn window_stats(state: &AppState, region: &RegionSelection) -> ApiResult<Vec<ItemStats>> {
    let since = window_start(now(), state.settings.item_stats_window_days);
    let rows = observations_since(&state.db, &state.settings, region, ObservationScope::Item, since).await?;
    Ok(item_stats(&rows, state.settings.tax_rate))
}

/// GET /api/stats/area
pub async fn area_stats(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<Vec<CategoryStats>>> {
    let since = window_start(now(), state.settings.area_stats_window_days);
    let rows = observations_since(
        &state.db,
        &state.settings,
        &query.selection(),
        ObservationScope::Category,
        since,
    )
    .await?;
    Ok(Json(category_stats(&rows, state.settings.tax_rate)))
}

/// GET /api/stats/trends
pub async fn trends(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<BTreeMap<String, CategoryTrend>>> {
    let since = window_start(now(), state.settings.area_stats_window_days);
    let rows = observations_since(
        &state.db,
        &state.settings,
        &query.selection(),
        ObservationScope::Category,
        since,
    )
    .await?;
    Ok(Json(price_trends(&rows, state.settings.tax_rate)))
}

/// GET /api/stats/items?q=
pub async fn items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> ApiResult<Json<Vec<ItemStats>>> {
    let mut stats = window_stats(&state, &query.region.selection()).await?;

    if let Some(needle) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let needle = needle.to_lowercase();
        stats.retain(|s| s.item_name.to_lowercase().contains(&needle));
    }

    Ok(Json(stats))
}

/// GET /api/stats/items/detail?item_name=&unit=
pub async fn item_detail(
    State(state): State<AppState>,
    Query(query): Query<ItemDetailQuery>,
) -> ApiResult<Json<Option<ItemStats>>> {
    let item_name = query
        .item_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("item_name is required".to_string()))?;
    let unit = query.unit.as_deref().filter(|u| !u.trim().is_empty());

    let stats = window_stats(&state, &query.region.selection()).await?;
    Ok(Json(find_item(&stats, item_name, unit).cloned()))
}

/// GET /api/stats/items/defaults
pub async fn default_item_stats(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<Vec<DefaultItemStats>>> {
    let stats = window_stats(&state, &query.selection()).await?;

    let result = DEFAULT_ITEMS
        .iter()
        .map(|item| DefaultItemStats {
            item: *item,
            stats: stats.iter().find(|s| s.item_name == item.name).cloned(),
        })
        .collect();
    Ok(Json(result))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats/area", get(area_stats))
        .route("/api/stats/trends", get(trends))
        .route("/api/stats/items", get(items))
        .route("/api/stats/items/detail", get(item_detail))
        .route("/api/stats/items/defaults", get(default_item_stats))
}
