//! kaushiru-server library - price posting and statistics HTTP service
//!
//! Handlers live in [`api`], database access in [`store`]. The router is
//! built here so integration tests can drive it without a socket.

use axum::Router;
use kaushiru_common::config::RuntimeSettings;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod mailer;
pub mod store;

use mailer::Mailer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Loaded once at startup from the `settings` table
    pub settings: Arc<RuntimeSettings>,
    pub mailer: Mailer,
    /// Public site URL, used for sitemap entries
    pub base_url: String,
}

impl AppState {
    pub fn new(db: SqlitePool, settings: RuntimeSettings, mailer: Mailer, base_url: impl Into<String>) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
            mailer,
            base_url: base_url.into(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::posts_routes())
        .merge(api::stats_routes())
        .merge(api::reactions_routes())
        .merge(api::buy_logs_routes())
        .merge(api::quotes_routes())
        .merge(api::contact_routes())
        .merge(api::catalog_routes())
        .merge(api::site_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
