//! Buy log endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use kaushiru_common::db::PublicBuyLog;
use serde::Serialize;

use crate::error::ApiResult;
use crate::store::buy_logs::{self, NewDailyLog, NewItemLog};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// POST /api/buy-logs/item
pub async fn create_item_log(
    State(state): State<AppState>,
    Json(input): Json<NewItemLog>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let id = buy_logs::save_item_log(&state.db, &state.settings, &input).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST /api/buy-logs/daily
pub async fn create_daily_log(
    State(state): State<AppState>,
    Json(input): Json<NewDailyLog>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let id = buy_logs::save_daily_log(&state.db, &state.settings, &input).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/buy-logs/public
pub async fn public_logs(State(state): State<AppState>) -> ApiResult<Json<Vec<PublicBuyLog>>> {
    Ok(Json(buy_logs::public_buy_logs(&state.db, &state.settings).await?))
}

pub fn buy_logs_routes() -> Router<AppState> {
    Router::new()
        .route("/api/buy-logs/item", post(create_item_log))
        .route("/api/buy-logs/daily", post(create_daily_log))
        .route("/api/buy-logs/public", get(public_logs))
}
