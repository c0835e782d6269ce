pub mod auth;
pub mod cli;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

use std::path::PathBuf;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Directory uploaded recipe images are written under.
    pub media_root: PathBuf,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool`
/// beforehand. `media_root` must be writable; upload handlers create
/// subdirectories under it as needed.
pub fn build_app(pool: SqlitePool, media_root: PathBuf) -> Router {
    let state = AppState {
        db: pool,
        media_root,
    };

    Router::new()
        .route("/health", get(health))
        .merge(routes::users::router())
        .merge(routes::recipes::router())
        .merge(routes::tags::router())
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
