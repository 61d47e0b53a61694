//! trackline: review queue backend for music submissions.
//!
//! Artists submit songs to a TikTok reviewer's queue; reviewers work the
//! queue front to back, reorder neighbors, and honor paid skips. State
//! lives in SQLite, queue changes fan out over SSE.

pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod payments;
pub mod routes;
pub mod state;
pub mod storage;

pub use error::{Error, Result};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let uploads_dir = state.config.upload_folder.clone();
    // Multipart framing overhead on top of the largest accepted file.
    let upload_body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/reviewers", get(routes::list_reviewers))
        .route("/api/reviewers/by-handle/:handle", get(routes::reviewer_by_handle))
        .route("/api/reviewers/:reviewer_id", get(routes::get_profile))
        .route(
            "/api/reviewers/:reviewer_id/queue",
            get(routes::get_queue).post(routes::submit_to_queue),
        )
        .route(
            "/api/reviewers/:reviewer_id/queue/:submission_id/move",
            post(routes::move_submission),
        )
        .route(
            "/api/reviewers/:reviewer_id/queue/:submission_id/complete",
            post(routes::complete_submission),
        )
        .route(
            "/api/reviewers/:reviewer_id/queue/:submission_id/remove",
            post(routes::remove_submission),
        )
        .route(
            "/api/reviewers/:reviewer_id/queue/:submission_id/skip",
            post(routes::skip_the_line),
        )
        .route("/api/reviewers/:reviewer_id/history", get(routes::get_history))
        .route("/api/reviewers/:reviewer_id/reviews", get(routes::reviews_by_reviewer))
        .route("/api/reviewers/:reviewer_id/events", get(routes::queue_events))
        .route(
            "/api/profiles/:user_id",
            get(routes::get_profile).put(routes::save_profile),
        )
        .route("/api/users/:user_id/submissions", get(routes::user_submissions))
        .route("/api/submissions/:submission_id", get(routes::get_submission))
        .route(
            "/api/submissions/:submission_id/reviews",
            get(routes::reviews_for_submission).post(routes::create_review),
        )
        .route("/api/submissions/:submission_id/rating", get(routes::get_rating))
        .route(
            "/api/upload",
            post(routes::upload_file).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .nest_service("/uploads", tower_http::services::ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
