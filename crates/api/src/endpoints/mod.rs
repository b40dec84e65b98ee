//! HTTP endpoints.

mod admin;
mod ajax;
mod pages;

use axum::{Json, Router, routing::get};
use blog_common::{AppError, AppResult};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Public blog routes, mounted both at the root and under `/blog`.
fn blog() -> Router<AppState> {
    Router::new().merge(pages::router()).merge(ajax::router())
}

/// Create the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(blog())
        .nest("/blog", blog())
        .nest("/admin", admin::router())
        .route("/health", get(health))
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Parse a post id path segment; anything non-numeric is an unknown post.
fn parse_post_id(segment: &str) -> AppResult<i64> {
    segment
        .parse()
        .map_err(|_| AppError::NotFound(format!("Post {segment}")))
}
