use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::state::AppState;
use crate::storage::{self, StoredFile};

/// Accepts a multipart form with a single `file` field and stores it under
/// the upload folder. The response `url` is what goes into a submission's
/// `artwork_url` / `audio_url`.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StoredFile>> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.bin").to_string();
        let declared_type = field.content_type().map(|t| t.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("unreadable multipart body: {e}")))?;

        let content_type = declared_type.unwrap_or_else(|| {
            mime_guess::from_path(&original_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

        let stored = storage::save_upload(
            &state.config.upload_folder,
            &original_name,
            &content_type,
            &data,
            state.config.max_upload_bytes,
        )?;
        tracing::info!(
            "stored upload {} ({}, {} bytes)",
            stored.filename,
            stored.content_type,
            stored.size
        );
        return Ok(Json(stored));
    }

    Err(Error::Validation(
        "multipart form must contain a 'file' field".to_string(),
    ))
}
