//! Router assembly: HTTP endpoints, optional static frontend, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod extract;
pub mod http;

/// Build the application router with:
/// - JSON API under `/api/...`
/// - Static SPA from `static_dir` with index fallback, when configured
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: Option<&str>) -> Router {
    let router = Router::new()
        .route("/api/health", get(http::http_health))
        .route("/api/challenges", get(http::http_list_challenges))
        .route("/api/challenge/:id", get(http::http_get_challenge))
        .route("/api/challenge/:id/submit", post(http::http_post_submit))
        .route(
            "/api/highscores",
            get(http::http_get_highscores).post(http::http_post_highscore),
        )
        .route("/api/highscores/", get(http::http_get_highscores))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    match static_dir {
        Some(dir) => {
            let index = format!("{}/index.html", dir.trim_end_matches('/'));
            let static_service = ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .not_found_service(ServeFile::new(index));
            router.fallback_service(static_service)
        }
        None => router,
    }
}
