use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::Review;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewReview {
    pub reviewer_id: String,
    pub rating: i64,
    pub comment: String,
}

pub async fn create(
    pool: &SqlitePool,
    submission_id: &str,
    new: NewReview,
) -> Result<Review> {
    if new.reviewer_id.trim().is_empty() {
        return Err(Error::Validation("reviewer_id is required".to_string()));
    }
    if !(1..=5).contains(&new.rating) {
        return Err(Error::Validation(format!(
            "rating must be between 1 and 5, got {}",
            new.rating
        )));
    }

    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM submissions WHERE id = ?")
        .bind(submission_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(Error::NotFound(format!(
            "submission {submission_id} not found"
        )));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO reviews (id, submission_id, reviewer_id, rating, comment, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(submission_id)
    .bind(&new.reviewer_id)
    .bind(new.rating)
    .bind(&new.comment)
    .bind(now)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn list_for_submission(
    pool: &SqlitePool,
    submission_id: &str,
) -> Result<Vec<Review>> {
    let rows = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE submission_id = ? ORDER BY created_at DESC",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_for_reviewer(pool: &SqlitePool, reviewer_id: &str) -> Result<Vec<Review>> {
    let rows = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE reviewer_id = ? ORDER BY created_at DESC",
    )
    .bind(reviewer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Mean rating rounded to one decimal place, 0.0 when nothing has been
/// rated yet.
pub async fn average_rating(pool: &SqlitePool, submission_id: &str) -> Result<f64> {
    let avg: (Option<f64>,) =
        sqlx::query_as("SELECT AVG(rating) FROM reviews WHERE submission_id = ?")
            .bind(submission_id)
            .fetch_one(pool)
            .await?;
    Ok(avg.0.map(round_half_up).unwrap_or(0.0))
}

fn round_half_up(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::round_half_up;

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_half_up(4.0), 4.0);
        assert_eq!(round_half_up(13.0 / 3.0), 4.3);
        assert_eq!(round_half_up(11.0 / 3.0), 3.7);
        assert_eq!(round_half_up(4.25), 4.3);
        assert_eq!(round_half_up(4.449), 4.4);
    }
}
