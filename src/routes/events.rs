use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::state::AppState;

/// SSE feed of one reviewer's queue changes. Lossy; clients refresh from
/// the queue endpoints after reconnecting.
pub async fn queue_events(
    State(state): State<Arc<AppState>>,
    Path(reviewer_id): Path<String>,
) -> impl IntoResponse {
    tracing::debug!(
        "sse listener attached for reviewer {} ({} already connected)",
        reviewer_id,
        state.events.client_count()
    );
    state.events.sse_response(reviewer_id)
}
