//! Post endpoints
//!
//! - `POST /api/forecasts`: legacy post (fixed category, size, mood)
//! - `POST /api/posts`: item-name post
//! - `GET /api/forecasts/recent`: newest posts of a region
//! - `GET /api/posts/mine`: the caller's posts
//! - `DELETE /api/posts/:id`: delete an own post

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use kaushiru_common::db::Post;
use serde::Deserialize;

use super::RegionQuery;
use crate::error::ApiResult;
use crate::store::posts::{self, NewLegacyPost, NewPost};
use crate::AppState;

/// `?user_uuid=`
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_uuid: String,
}

/// POST /api/forecasts
pub async fn create_legacy_post(
    State(state): State<AppState>,
    Json(input): Json<NewLegacyPost>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = posts::save_legacy_post(&state.db, &state.settings, &input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<NewPost>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = posts::save_post(&state.db, &state.settings, &input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/forecasts/recent?big=&prefecture=&city=
pub async fn recent_posts(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let posts = posts::recent_posts(&state.db, &state.settings, &query.selection()).await?;
    Ok(Json(posts))
}

/// GET /api/posts/mine?user_uuid=
pub async fn my_posts(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let posts = posts::my_posts(&state.db, &state.settings, &query.user_uuid).await?;
    Ok(Json(posts))
}

/// DELETE /api/posts/:id?user_uuid=
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<StatusCode> {
    posts::delete_post(&state.db, &id, &query.user_uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn posts_routes() -> Router<AppState> {
    Router::new()
        .route("/api/forecasts", post(create_legacy_post))
        .route("/api/forecasts/recent", get(recent_posts))
        .route("/api/posts", post(create_post))
        .route("/api/posts/mine", get(my_posts))
        .route("/api/posts/:id", delete(delete_post))
}
