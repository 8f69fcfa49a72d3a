//! Quote of the day

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use kaushiru_common::db::DailyQuote;
use kaushiru_common::time::now;
use tracing::warn;

use super::RegionQuery;
use crate::store::quotes;
use crate::AppState;

/// GET /api/quotes/today?big=&prefecture=&city=
///
/// Always 200; `null` when there is no quote or it could not be read.
pub async fn today_quote(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> Json<Option<DailyQuote>> {
    match quotes::today_quote(&state.db, &query.selection(), now()).await {
        Ok(quote) => Json(quote),
        Err(e) => {
            warn!("Quote of the day unavailable: {}", e);
            Json(None)
        }
    }
}

pub fn quotes_routes() -> Router<AppState> {
    Router::new().route("/api/quotes/today", get(today_quote))
}
