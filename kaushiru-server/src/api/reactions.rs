//! Reaction endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::ApiResult;
use crate::store::reactions::{self, parse_post_ids};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub post_id: String,
    pub user_uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct CountsQuery {
    /// Comma-separated post ids
    #[serde(default)]
    pub post_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MineQuery {
    #[serde(default)]
    pub user_uuid: String,
    #[serde(default)]
    pub post_ids: Option<String>,
}

/// POST /api/reactions
pub async fn add_reaction(
    State(state): State<AppState>,
    Json(req): Json<ReactionRequest>,
) -> ApiResult<StatusCode> {
    reactions::add_reaction(&state.db, &req.post_id, &req.user_uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/reactions
pub async fn remove_reaction(
    State(state): State<AppState>,
    Json(req): Json<ReactionRequest>,
) -> ApiResult<StatusCode> {
    reactions::remove_reaction(&state.db, &req.post_id, &req.user_uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/reactions/counts?post_ids=a,b
pub async fn reaction_counts(
    State(state): State<AppState>,
    Query(query): Query<CountsQuery>,
) -> ApiResult<Json<BTreeMap<String, i64>>> {
    let ids = parse_post_ids(query.post_ids.as_deref());
    Ok(Json(reactions::reaction_counts(&state.db, &ids).await?))
}

/// GET /api/reactions/mine?user_uuid=&post_ids=a,b
pub async fn user_reactions(
    State(state): State<AppState>,
    Query(query): Query<MineQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let ids = parse_post_ids(query.post_ids.as_deref());
    Ok(Json(reactions::user_reactions(&state.db, &query.user_uuid, &ids).await?))
}

pub fn reactions_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reactions", post(add_reaction).delete(remove_reaction))
        .route("/api/reactions/counts", get(reaction_counts))
        .route("/api/reactions/mine", get(user_reactions))
}
