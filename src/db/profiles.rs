use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::models::{Profile, ReviewerListing};
use crate::error::Result;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
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
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Profile>> {
    let row = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_handle(pool: &SqlitePool, handle: &str) -> Result<Option<Profile>> {
    let row = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE tiktok_handle = ?")
        .bind(handle)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Create or replace a profile. `created_at` survives updates, everything
/// else is the caller's latest word.
pub async fn upsert(pool: &SqlitePool, id: &str, update: ProfileUpdate) -> Result<Profile> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO profiles \
             (id, username, email, artist_name, tiktok_handle, reviewer_name, bio, \
              profile_image_url, is_reviewer, skip_price_usd, skip_price_sei, \
              free_skips, reviewer_url, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14) \
         ON CONFLICT(id) DO UPDATE SET \
             username = excluded.username, \
             email = excluded.email, \
             artist_name = excluded.artist_name, \
             tiktok_handle = excluded.tiktok_handle, \
             reviewer_name = excluded.reviewer_name, \
             bio = excluded.bio, \
             profile_image_url = excluded.profile_image_url, \
             is_reviewer = excluded.is_reviewer, \
             skip_price_usd = excluded.skip_price_usd, \
             skip_price_sei = excluded.skip_price_sei, \
             free_skips = excluded.free_skips, \
             reviewer_url = excluded.reviewer_url, \
             updated_at = excluded.updated_at",
    )
    .bind(id)
    .bind(&update.username)
    .bind(&update.email)
    .bind(&update.artist_name)
    .bind(&update.tiktok_handle)
    .bind(&update.reviewer_name)
    .bind(&update.bio)
    .bind(&update.profile_image_url)
    .bind(update.is_reviewer)
    .bind(update.skip_price_usd)
    .bind(update.skip_price_sei)
    .bind(update.free_skips)
    .bind(&update.reviewer_url)
    .bind(now)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Public reviewer directory: every profile with a TikTok handle, with
/// live queue depth and completed-review count.
pub async fn reviewer_directory(pool: &SqlitePool) -> Result<Vec<ReviewerListing>> {
    let rows = sqlx::query_as::<_, ReviewerListing>(
        "SELECT p.id, p.username, p.tiktok_handle, p.reviewer_name, p.reviewer_url, \
                p.profile_image_url, p.skip_price_usd, p.skip_price_sei, p.free_skips, \
                (SELECT COUNT(*) FROM submissions s \
                 WHERE s.reviewer_id = p.id AND s.status = 'pending') AS queue_length, \
                (SELECT COUNT(*) FROM reviews r \
                 WHERE r.reviewer_id = p.id) AS reviews_completed \
         FROM profiles p \
         WHERE TRIM(p.tiktok_handle) <> '' \
         ORDER BY p.tiktok_handle COLLATE NOCASE",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
