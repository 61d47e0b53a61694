//! Queue manager: per-reviewer submission ordering and lifecycle.
//!
//! Ordering is authoritative in the store. Pending submissions hold unique
//! `queue_position` slots per reviewer (partial unique index); reviewed and
//! removed rows fall out of the ordering and never come back.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::Submission;
use crate::error::{Error, Result};
use crate::payments::{self, SkipProof};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_REVIEWED: &str = "reviewed";
pub const STATUS_REMOVED: &str = "removed";

/// Retries when a concurrent enqueue claims the same position slot.
const POSITION_RETRY_LIMIT: u32 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewSubmission {
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
}

fn validate_new(new: &NewSubmission) -> Result<()> {
    let mut missing = Vec::new();
    if new.submitter_id.trim().is_empty() {
        missing.push("submitter_id");
    }
    if new.artist_name.trim().is_empty() {
        missing.push("artist_name");
    }
    if new.tiktok_name.trim().is_empty() {
        missing.push("tiktok_name");
    }
    if new.song_title.trim().is_empty() {
        missing.push("song_title");
    }
    if new.song_story.trim().is_empty() {
        missing.push("song_story");
    }
    if new.song_link.trim().is_empty() {
        missing.push("song_link");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}

pub async fn get(pool: &SqlitePool, submission_id: &str) -> Result<Option<Submission>> {
    let row = sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = ?")
        .bind(submission_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Pending queue for a reviewer, front first. Unknown reviewers simply
/// have an empty queue.
pub async fn list_queue(pool: &SqlitePool, reviewer_id: &str) -> Result<Vec<Submission>> {
    let rows = sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions \
         WHERE reviewer_id = ? AND status = 'pending' \
         ORDER BY queue_position ASC, created_at ASC",
    )
    .bind(reviewer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Append a submission to the back of a reviewer's queue.
///
/// The position is computed inside the INSERT itself (max pending slot
/// plus one, or 0 for an empty queue), so two racing enqueues either get
/// distinct slots or one trips the unique index and retries.
pub async fn enqueue(
    pool: &SqlitePool,
    reviewer_id: &str,
    new: NewSubmission,
) -> Result<Submission> {
    validate_new(&new)?;

    let accepting: Option<(bool,)> =
        sqlx::query_as("SELECT is_reviewer FROM profiles WHERE id = ?")
            .bind(reviewer_id)
            .fetch_optional(pool)
            .await?;
    if !matches!(accepting, Some((true,))) {
        return Err(Error::NotFound(format!(
            "reviewer {reviewer_id} not found or not accepting submissions"
        )));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let mut attempts = 0;
    loop {
        let res = sqlx::query(
            "INSERT INTO submissions \
                 (id, reviewer_id, submitter_id, artist_name, tiktok_name, song_title, \
                  genre, song_story, song_link, featuring, artwork_url, audio_url, \
                  status, queue_position, created_at, updated_at) \
             VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'pending', \
                  COALESCE((SELECT MAX(queue_position) + 1 FROM submissions \
                            WHERE reviewer_id = ?2 AND status = 'pending'), 0), \
                  ?13, ?13)",
        )
        .bind(&id)
        .bind(reviewer_id)
        .bind(&new.submitter_id)
        .bind(&new.artist_name)
        .bind(&new.tiktok_name)
        .bind(&new.song_title)
        .bind(&new.genre)
        .bind(&new.song_story)
        .bind(&new.song_link)
        .bind(&new.featuring)
        .bind(&new.artwork_url)
        .bind(&new.audio_url)
        .bind(now)
        .execute(pool)
        .await;

        match res {
            Ok(_) => break,
            Err(err) if is_unique_violation(&err) && attempts < POSITION_RETRY_LIMIT => {
                attempts += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    get(pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("submission {id} vanished after insert")))
}

/// Trade queue slots with the pending submission currently holding
/// `target_position`. One transaction: either both rows move or neither.
///
/// The moving row parks on NULL for the middle step because the partial
/// unique index forbids two pending rows on one slot.
pub async fn reorder(
    pool: &SqlitePool,
    reviewer_id: &str,
    submission_id: &str,
    target_position: i64,
) -> Result<Submission> {
    let mut tx = pool.begin().await?;

    let moving: Option<Submission> = sqlx::query_as(
        "SELECT * FROM submissions \
         WHERE id = ? AND reviewer_id = ? AND status = 'pending'",
    )
    .bind(submission_id)
    .bind(reviewer_id)
    .fetch_optional(&mut *tx)
    .await?;
    let moving = moving.ok_or_else(|| {
        Error::NotFound(format!(
            "submission {submission_id} is not pending for reviewer {reviewer_id}"
        ))
    })?;

    let current = moving.queue_position.ok_or_else(|| {
        Error::InvalidOperation(format!("submission {submission_id} has no queue position"))
    })?;
    if target_position == current {
        return Err(Error::InvalidOperation(format!(
            "submission {submission_id} already holds position {target_position}"
        )));
    }

    // Covers moving the head up, the tail down, and gaps left by skips:
    // there is nobody to trade with.
    let neighbor: Option<Submission> = sqlx::query_as(
        "SELECT * FROM submissions \
         WHERE reviewer_id = ? AND status = 'pending' AND queue_position = ?",
    )
    .bind(reviewer_id)
    .bind(target_position)
    .fetch_optional(&mut *tx)
    .await?;
    let neighbor = neighbor.ok_or_else(|| {
        Error::InvalidOperation(format!(
            "no pending submission at position {target_position}"
        ))
    })?;

    let now = Utc::now();
    sqlx::query("UPDATE submissions SET queue_position = NULL WHERE id = ?")
        .bind(&moving.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE submissions SET queue_position = ?, updated_at = ? WHERE id = ?")
        .bind(current)
        .bind(now)
        .bind(&neighbor.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE submissions SET queue_position = ?, updated_at = ? WHERE id = ?")
        .bind(target_position)
        .bind(now)
        .bind(&moving.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    get(pool, submission_id).await?.ok_or_else(|| {
        Error::NotFound(format!("submission {submission_id} vanished after reorder"))
    })
}

pub async fn mark_reviewed(
    pool: &SqlitePool,
    reviewer_id: &str,
    submission_id: &str,
) -> Result<Submission> {
    transition(pool, reviewer_id, submission_id, STATUS_REVIEWED).await
}

pub async fn remove(
    pool: &SqlitePool,
    reviewer_id: &str,
    submission_id: &str,
) -> Result<Submission> {
    transition(pool, reviewer_id, submission_id, STATUS_REMOVED).await
}

/// One-way exit from pending. The guard on `status = 'pending'` makes a
/// repeat transition (or a transition on someone else's submission) a
/// NotFound, never a double apply.
async fn transition(
    pool: &SqlitePool,
    reviewer_id: &str,
    submission_id: &str,
    to: &str,
) -> Result<Submission> {
    let now = Utc::now();
    let res = sqlx::query(
        "UPDATE submissions SET status = ?, updated_at = ? \
         WHERE id = ? AND reviewer_id = ? AND status = 'pending'",
    )
    .bind(to)
    .bind(now)
    .bind(submission_id)
    .bind(reviewer_id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "submission {submission_id} is not pending for reviewer {reviewer_id}"
        )));
    }

    get(pool, submission_id).await?.ok_or_else(|| {
        Error::NotFound(format!("submission {submission_id} vanished after update"))
    })
}

/// Paid jump to the front of the queue: new position is one less than the
/// smallest pending position (which can go negative, only order matters).
///
/// The proof reference is consumed in the same transaction, so a proof
/// pays for at most one skip and a failed skip does not burn it.
pub async fn skip_line(
    pool: &SqlitePool,
    reviewer_id: &str,
    submission_id: &str,
    proof: &SkipProof,
    secret: &str,
) -> Result<Submission> {
    payments::verify(proof, submission_id, reviewer_id, secret)?;

    let mut tx = pool.begin().await?;

    let receipt = sqlx::query(
        "INSERT INTO skip_receipts (proof_ref, submission_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(&proof.reference)
    .bind(submission_id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await;
    match receipt {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            return Err(Error::PaymentRequired(format!(
                "payment proof {} already used",
                proof.reference
            )));
        }
        Err(err) => return Err(err.into()),
    }

    let now = Utc::now();
    let res = sqlx::query(
        "UPDATE submissions SET \
             queue_position = COALESCE((SELECT MIN(queue_position) FROM submissions \
                                        WHERE reviewer_id = ?1 AND status = 'pending' \
                                          AND id <> ?2), 1) - 1, \
             updated_at = ?3 \
         WHERE id = ?2 AND reviewer_id = ?1 AND status = 'pending'",
    )
    .bind(reviewer_id)
    .bind(submission_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if res.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "submission {submission_id} is not pending for reviewer {reviewer_id}"
        )));
    }

    tx.commit().await?;

    get(pool, submission_id).await?.ok_or_else(|| {
        Error::NotFound(format!("submission {submission_id} vanished after skip"))
    })
}

/// Reviewed submissions, most recently finished first.
pub async fn list_history(pool: &SqlitePool, reviewer_id: &str) -> Result<Vec<Submission>> {
    let rows = sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions \
         WHERE reviewer_id = ? AND status = 'reviewed' \
         ORDER BY updated_at DESC",
    )
    .bind(reviewer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Everything an artist has submitted, newest first, across reviewers
/// and statuses.
pub async fn list_for_submitter(
    pool: &SqlitePool,
    submitter_id: &str,
    limit: i64,
) -> Result<Vec<Submission>> {
    let rows = sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions \
         WHERE submitter_id = ? \
         ORDER BY created_at DESC \
         LIMIT ?",
    )
    .bind(submitter_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
