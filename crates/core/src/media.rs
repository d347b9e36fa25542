//! Rules for uploaded character media.
//!
//! Pure validation; the API layer owns the actual file writes.

use crate::error::CoreError;

/// Extensions accepted for uploads (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Maximum accepted upload size in bytes (20 MiB).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// URL prefix under which the uploads directory is served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Default media type when the upload form does not specify one.
pub const DEFAULT_MEDIA_TYPE: &str = "character";

/// Return the lowercase extension of `filename` if it is an allowed image type.
pub fn validate_extension(filename: &str) -> Result<String, CoreError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or_else(|| CoreError::Validation(format!("File '{filename}' has no extension")))?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported file type '.{ext}'. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Check that a value is safe to use as a single directory name.
///
/// Allows ASCII letters, digits, `-` and `_` only.
pub fn validate_path_segment(field: &str, value: &str) -> Result<(), CoreError> {
    let ok = !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be 1-64 characters of [A-Za-z0-9_-]"
        )))
    }
}

/// Chat send percentage is a probability in whole percent.
pub fn validate_chat_send_percent(value: i32) -> Result<(), CoreError> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "chatSendPercent must be between 0 and 100".into(),
        ))
    }
}

/// Relative storage path `<character_id>/<media_type>/<file_stem>.<ext>`.
pub fn storage_relative_path(character_id: &str, media_type: &str, file_stem: &str, ext: &str) -> String {
    format!("{character_id}/{media_type}/{file_stem}.{ext}")
}

/// Public URL for a stored relative path.
pub fn public_url(relative_path: &str) -> String {
    format!("{UPLOADS_URL_PREFIX}/{relative_path}")
}

/// Split a comma-separated form value into trimmed, de-duplicated tags.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
