//! Shared constants.

/// URL prefix under which the local backend exposes stored objects.
pub const DEFAULT_LOCAL_URL_PREFIX: &str = "/uploads";

/// Default root directory of the local backend.
pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "./uploads";

/// Directory (relative to the local root) holding partially written uploads.
pub const LOCAL_STAGING_DIR: &str = ".staging";

/// Minimum object age, in hours, before the reclaimer may delete it.
pub const DEFAULT_RECLAIM_MIN_AGE_HOURS: i64 = 24;

/// Largest accepted minimum object age: one year.
pub const MAX_RECLAIM_MIN_AGE_HOURS: i64 = 24 * 365;

/// Page size used when listing a prefix during a reclaim pass.
pub const DEFAULT_RECLAIM_BATCH_SIZE: usize = 100;

/// Daily reclaim time of day, UTC.
pub const DEFAULT_RECLAIM_RUN_AT: &str = "02:00";

/// Content type reported when none can be determined.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
