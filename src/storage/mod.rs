use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Media types accepted for artwork, songs and clips.
const ALLOWED_TYPE_PREFIXES: [&str; 3] = ["image/", "audio/", "video/"];

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub content_type: String,
}

pub fn ensure_dirs(upload_folder: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_folder)
}

fn generate_filename(original_name: &str) -> String {
    // Only the extension survives from the client's filename, stripped to
    // ASCII alphanumerics. Everything else is generated.
    let ext: String = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };

    format!(
        "{}_{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().to_string()[..8].to_string(),
        ext.to_lowercase()
    )
}

pub fn save_upload(
    upload_folder: &Path,
    original_name: &str,
    content_type: &str,
    data: &[u8],
    max_bytes: usize,
) -> Result<StoredFile> {
    if !ALLOWED_TYPE_PREFIXES
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
    {
        return Err(Error::Validation(format!(
            "unsupported file type {content_type}: only image, audio and video uploads are accepted"
        )));
    }
    if data.is_empty() {
        return Err(Error::Validation("uploaded file is empty".to_string()));
    }
    if data.len() > max_bytes {
        return Err(Error::Validation(format!(
            "file is {} bytes, limit is {max_bytes}",
            data.len()
        )));
    }

    let filename = generate_filename(original_name);
    std::fs::write(upload_folder.join(&filename), data)?;

    Ok(StoredFile {
        url: format!("/uploads/{filename}"),
        filename,
        size: data.len(),
        content_type: content_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_disallowed_content_types() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_upload(dir.path(), "x.exe", "application/octet-stream", b"MZ", 1024)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn rejects_oversized_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let too_big = save_upload(dir.path(), "a.png", "image/png", &[0u8; 32], 16).unwrap_err();
        assert!(matches!(too_big, Error::Validation(_)));

        let empty = save_upload(dir.path(), "a.png", "image/png", &[], 16).unwrap_err();
        assert!(matches!(empty, Error::Validation(_)));
    }

    #[test]
    fn writes_the_file_and_returns_a_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let stored = save_upload(dir.path(), "cover.PNG", "image/png", b"png-bytes", 1024).unwrap();

        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.filename.ends_with(".png"));
        assert_eq!(stored.size, 9);

        let on_disk = std::fs::read(dir.path().join(&stored.filename)).unwrap();
        assert_eq!(on_disk, b"png-bytes");
    }

    #[test]
    fn client_filenames_cannot_carry_paths() {
        let dir = tempfile::tempdir().unwrap();
        let stored =
            save_upload(dir.path(), "../../etc/passwd.mp3", "audio/mpeg", b"id3", 1024).unwrap();

        assert!(!stored.filename.contains('/'));
        assert!(!stored.filename.contains(".."));
        assert!(stored.filename.ends_with(".mp3"));
        assert!(dir.path().join(&stored.filename).exists());
    }

    #[test]
    fn generated_names_do_not_collide() {
        let a = generate_filename("song.mp3");
        let b = generate_filename("song.mp3");
        assert_ne!(a, b);
    }
}
