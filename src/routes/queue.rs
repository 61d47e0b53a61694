use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::models::Submission;
use crate::db::queue::{self, NewSubmission};
use crate::error::{Error, Result};
use crate::notify::{QueueEvent, QueueEventData};
use crate::payments::SkipProof;
use crate::state::AppState;

pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Path(reviewer_id): Path<String>,
) -> Result<Json<Vec<Submission>>> {
    let entries = queue::list_queue(state.pool.as_ref(), &reviewer_id).await?;
    Ok(Json(entries))
}

pub async fn submit_to_queue(
    State(state): State<Arc<AppState>>,
    Path(reviewer_id): Path<String>,
    Json(new): Json<NewSubmission>,
) -> Result<(StatusCode, Json<Submission>)> {
    let submission = queue::enqueue(state.pool.as_ref(), &reviewer_id, new).await?;
    tracing::info!(
        "submission {} enqueued for reviewer {} at position {}",
        submission.id,
        reviewer_id,
        submission.queue_position.unwrap_or_default()
    );

    state.events.publish(QueueEvent {
        reviewer_id,
        data: QueueEventData::Enqueued {
            submission_id: submission.id.clone(),
            queue_position: submission.queue_position.unwrap_or_default(),
        },
    });
    Ok((StatusCode::CREATED, Json(submission)))
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub target_position: i64,
}

pub async fn move_submission(
    State(state): State<Arc<AppState>>,
    Path((reviewer_id, submission_id)): Path<(String, String)>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Submission>> {
    let submission = queue::reorder(
        state.pool.as_ref(),
        &reviewer_id,
        &submission_id,
        req.target_position,
    )
    .await?;

    state.events.publish(QueueEvent {
        reviewer_id,
        data: QueueEventData::Reordered {
            submission_id: submission.id.clone(),
            queue_position: submission.queue_position.unwrap_or_default(),
        },
    });
    Ok(Json(submission))
}

pub async fn complete_submission(
    State(state): State<Arc<AppState>>,
    Path((reviewer_id, submission_id)): Path<(String, String)>,
) -> Result<Json<Submission>> {
    let submission = queue::mark_reviewed(state.pool.as_ref(), &reviewer_id, &submission_id).await?;
    tracing::info!("submission {} reviewed by {}", submission.id, reviewer_id);

    state.events.publish(QueueEvent {
        reviewer_id,
        data: QueueEventData::Completed {
            submission_id: submission.id.clone(),
        },
    });
    Ok(Json(submission))
}

pub async fn remove_submission(
    State(state): State<Arc<AppState>>,
    Path((reviewer_id, submission_id)): Path<(String, String)>,
) -> Result<Json<Submission>> {
    let submission = queue::remove(state.pool.as_ref(), &reviewer_id, &submission_id).await?;
    tracing::info!("submission {} removed by {}", submission.id, reviewer_id);

    state.events.publish(QueueEvent {
        reviewer_id,
        data: QueueEventData::Removed {
            submission_id: submission.id.clone(),
        },
    });
    Ok(Json(submission))
}

pub async fn skip_the_line(
    State(state): State<Arc<AppState>>,
    Path((reviewer_id, submission_id)): Path<(String, String)>,
    Json(proof): Json<SkipProof>,
) -> Result<Json<Submission>> {
    let submission = queue::skip_line(
        state.pool.as_ref(),
        &reviewer_id,
        &submission_id,
        &proof,
        &state.config.skip_payment_secret,
    )
    .await?;
    tracing::info!(
        "submission {} skipped to the front of {}'s queue (proof {})",
        submission.id,
        reviewer_id,
        proof.reference
    );

    state.events.publish(QueueEvent {
        reviewer_id,
        data: QueueEventData::LineSkipped {
            submission_id: submission.id.clone(),
            queue_position: submission.queue_position.unwrap_or_default(),
        },
    });
    Ok(Json(submission))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(reviewer_id): Path<String>,
) -> Result<Json<Vec<Submission>>> {
    let entries = queue::list_history(state.pool.as_ref(), &reviewer_id).await?;
    Ok(Json(entries))
}

pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
) -> Result<Json<Submission>> {
    let submission = queue::get(state.pool.as_ref(), &submission_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("submission {submission_id} not found")))?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize)]
pub struct SubmitterParams {
    pub limit: Option<i64>,
}

pub async fn user_submissions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<SubmitterParams>,
) -> Result<Json<Vec<Submission>>> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let entries = queue::list_for_submitter(state.pool.as_ref(), &user_id, limit).await?;
    Ok(Json(entries))
}
