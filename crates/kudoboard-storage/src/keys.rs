//! Shared key generation and validation for storage backends.
//!
//! Generated keys look like `{prefix}/{name}-{YYYYMMDDHHMMSS}-{suffix}{ext}`.

use chrono::Utc;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};
use kudoboard_core::constants::DEFAULT_CONTENT_TYPE;

const SUFFIX_LEN: usize = 8;

/// Reduce a client supplied file name to a safe base name.
///
/// Directory components are dropped and anything other than ASCII
/// alphanumerics, `-`, `_` and `.` becomes `_`.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Build a collision-resistant file name: `{name}-{timestamp}-{suffix}{ext}`.
pub fn unique_filename(original: &str) -> String {
    let sanitized = sanitize_filename(original);
    let (name, ext) = match sanitized.rfind('.') {
        Some(idx) if idx > 0 => sanitized.split_at(idx),
        _ => (sanitized.as_str(), ""),
    };

    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let id = Uuid::new_v4().simple().to_string();

    format!("{}-{}-{}{}", name, timestamp, &id[..SUFFIX_LEN], ext)
}

/// Join a destination prefix and a file name into a key.
pub fn join_key(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix, filename)
    }
}

/// Generate a fresh key for `filename` below `prefix`.
pub fn generate_key(prefix: &str, filename: &str) -> StorageResult<String> {
    validate_prefix(prefix)?;
    let key = join_key(prefix, &unique_filename(filename));
    validate_key(&key)?;
    Ok(key)
}

/// Reject keys that are empty, absolute or escape the namespace.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must be relative: {}",
            key
        )));
    }
    if key.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains path traversal: {}",
            key
        )));
    }
    Ok(())
}

/// Prefixes follow the key rules but may be empty.
pub fn validate_prefix(prefix: &str) -> StorageResult<()> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(());
    }
    validate_key(trimmed)
}

/// Content type for a key, guessed from its extension.
pub fn guess_content_type(key: &str) -> String {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}
