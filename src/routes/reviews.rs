use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::models::Review;
use crate::db::reviews::{self, NewReview};
use crate::error::Result;
use crate::state::AppState;

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
    Json(new): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = reviews::create(state.pool.as_ref(), &submission_id, new).await?;
    tracing::info!(
        "review {} ({} stars) added to submission {}",
        review.id,
        review.rating,
        submission_id
    );
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn reviews_for_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let rows = reviews::list_for_submission(state.pool.as_ref(), &submission_id).await?;
    Ok(Json(rows))
}

pub async fn reviews_by_reviewer(
    State(state): State<Arc<AppState>>,
    Path(reviewer_id): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let rows = reviews::list_for_reviewer(state.pool.as_ref(), &reviewer_id).await?;
    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub submission_id: String,
    pub average_rating: f64,
}

pub async fn get_rating(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
) -> Result<Json<RatingResponse>> {
    let average_rating = reviews::average_rating(state.pool.as_ref(), &submission_id).await?;
    Ok(Json(RatingResponse {
        submission_id,
        average_rating,
    }))
}
