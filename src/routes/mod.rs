mod events;
mod profiles;
mod queue;
mod reviews;
mod upload;

pub use events::queue_events;
pub use profiles::{get_profile, list_reviewers, reviewer_by_handle, save_profile};
pub use queue::{
    complete_submission, get_history, get_queue, get_submission, move_submission,
    remove_submission, skip_the_line, submit_to_queue, user_submissions,
};
pub use reviews::{create_review, get_rating, reviews_by_reviewer, reviews_for_submission};
pub use upload::upload_file;

use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
