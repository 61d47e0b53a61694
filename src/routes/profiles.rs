use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::models::{Profile, ReviewerListing};
use crate::db::profiles::{self, ProfileUpdate};
use crate::error::{Error, Result};
use crate::state::AppState;

pub async fn list_reviewers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReviewerListing>>> {
    let listings = profiles::reviewer_directory(state.pool.as_ref()).await?;
    Ok(Json(listings))
}

pub async fn reviewer_by_handle(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<Profile>> {
    let profile = profiles::find_by_handle(state.pool.as_ref(), &handle)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no reviewer with handle {handle}")))?;
    Ok(Json(profile))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>> {
    let profile = profiles::get(state.pool.as_ref(), &user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("profile {user_id} not found")))?;
    Ok(Json(profile))
}

pub async fn save_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    if user_id.trim().is_empty() {
        return Err(Error::Validation("user id is required".to_string()));
    }
    let profile = profiles::upsert(state.pool.as_ref(), &user_id, update).await?;
    tracing::info!("profile {} saved", profile.id);
    Ok(Json(profile))
}
