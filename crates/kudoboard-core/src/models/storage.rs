//! Stored object model: what a backend reports about a single object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing one stored object.
///
/// Returned by save and list operations; never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Backend-relative key, e.g. `image/user_7/cat-20240101120000-1a2b3c4d.png`.
    pub key: String,
    /// The reference clients use to fetch the object (path or URL).
    pub public_ref: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

impl ObjectInfo {
    /// The generated file name, i.e. the last segment of the key.
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Whether the object was last modified strictly before `cutoff`.
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_modified < cutoff
    }
}
