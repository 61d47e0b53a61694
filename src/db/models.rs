use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub reviewer_id: String,
    pub submitter_id: String,
    pub artist_name: String,
    pub tiktok_name: String,
    pub song_title: String,
    pub genre: String,
    pub song_story: String,
    pub song_link: String,
    pub featuring: String,
    pub artwork_url: Option<String>,
    pub audio_url: Option<String>,
    pub status: String,
    /// Slot in the reviewer's pending queue, unique per reviewer among
    /// pending submissions. Stale once the submission leaves pending;
    /// NULL only mid-swap while a reorder trades slots.
    pub queue_position: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub artist_name: String,
    pub tiktok_handle: String,
    pub reviewer_name: String,
    pub bio: String,
    pub profile_image_url: Option<String>,
    pub is_reviewer: bool,
    pub skip_price_usd: f64,
    pub skip_price_sei: f64,
    pub free_skips: i64,
    pub reviewer_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub submission_id: String,
    pub reviewer_id: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Directory entry for the public reviewer listing: profile basics plus
/// live queue and review counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewerListing {
    pub id: String,
    pub username: String,
    pub tiktok_handle: String,
    pub reviewer_name: String,
    pub reviewer_url: String,
    pub profile_image_url: Option<String>,
    pub skip_price_usd: f64,
    pub skip_price_sei: f64,
    pub free_skips: i64,
    pub queue_length: i64,
    pub reviews_completed: i64,
}
