use std::path::Path;

use chrono::Utc;

use crate::http::error::ApiError;
use crate::http::types::AppState;

/// A file pulled out of a multipart request.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Persist an upload under a name derived from a stable prefix and the
/// current time, keeping the original extension. The timestamp suffix keeps
/// concurrent uploads for the same course from colliding (unlikely, not
/// guaranteed; see DESIGN.md).
pub fn store_upload(
    state: &AppState,
    prefix: &str,
    upload: &UploadedFile,
) -> Result<String, ApiError> {
    let ext = Path::new(&upload.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let stored_name = format!("{}_{}{}", sanitize(prefix), Utc::now().timestamp_millis(), ext);

    std::fs::create_dir_all(&state.upload_dir)
        .map_err(|e| ApiError::Internal(e.into()))?;
    std::fs::write(state.upload_dir.join(&stored_name), &upload.bytes)
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(stored_name)
}

/// Best-effort removal of a locally hosted file behind a stored link. Links
/// that point elsewhere, and filesystem failures, are ignored: the database
/// row is the source of truth.
pub fn remove_local_file(state: &AppState, file_link: &str) {
    if let Some(name) = file_link.split("/static/").nth(1) {
        // Guard against path traversal in stored links.
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return;
        }
        let _ = std::fs::remove_file(state.upload_dir.join(name));
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn sanitize_replaces_non_alphanumerics() {
        assert_eq!(sanitize("CS3401"), "CS3401");
        assert_eq!(sanitize("21HI53IT/A"), "21HI53IT_A");
        assert_eq!(sanitize("a b.c"), "a_b_c");
    }
}
