use chrono::{DateTime, Duration, Utc};
use kudoboard_core::constants::{
    DEFAULT_RECLAIM_BATCH_SIZE, DEFAULT_RECLAIM_MIN_AGE_HOURS, MAX_RECLAIM_MIN_AGE_HOURS,
};
use kudoboard_core::{Category, ObjectInfo, ReclaimSettings};
use kudoboard_db::ReferenceLookup;
use kudoboard_storage::Storage;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Settings for one reclaimer instance.
#[derive(Clone, Debug)]
pub struct ReclaimConfig {
    /// Prefixes scanned in order, one per object category.
    pub prefixes: Vec<String>,
    /// Objects younger than this are never deleted.
    pub min_age: Duration,
    /// Page size of each listing call.
    pub batch_size: usize,
    /// Count and log orphans without deleting them.
    pub dry_run: bool,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            prefixes: Category::ALL.iter().map(Category::scan_prefix).collect(),
            min_age: Duration::hours(DEFAULT_RECLAIM_MIN_AGE_HOURS),
            batch_size: DEFAULT_RECLAIM_BATCH_SIZE,
            dry_run: false,
        }
    }
}

impl ReclaimConfig {
    pub fn from_settings(settings: &ReclaimSettings) -> Self {
        Self {
            min_age: Duration::hours(settings.min_age_hours.clamp(0, MAX_RECLAIM_MIN_AGE_HOURS)),
            batch_size: settings.batch_size,
            ..Self::default()
        }
    }
}

/// Outcome of scanning one prefix.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PrefixReport {
    pub prefix: String,
    /// Objects listed.
    pub scanned: usize,
    /// Objects old enough to be considered.
    pub processed: usize,
    /// Considered objects with no owning reference.
    pub orphaned: usize,
    pub deleted: usize,
    /// Failed deletions.
    pub errors: usize,
    /// Pages skipped because the reference lookup failed.
    pub failed_pages: usize,
    /// Set when the scan of this prefix stopped early.
    pub aborted: Option<String>,
}

impl PrefixReport {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.failed_pages == 0 && self.aborted.is_none()
    }
}

/// Aggregate outcome of one reclaim run.
#[derive(Clone, Debug, Serialize)]
pub struct ReclaimReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    /// The run stopped early because it was cancelled.
    pub cancelled: bool,
    pub total_processed: usize,
    pub total_deleted: usize,
    /// Delete failures, skipped pages and aborted prefixes.
    pub total_errors: usize,
    pub aborted_prefixes: usize,
    /// Set when the run could not start at all.
    pub failure: Option<String>,
    pub prefixes: Vec<PrefixReport>,
}

impl ReclaimReport {
    pub fn prefix(&self, prefix: &str) -> Option<&PrefixReport> {
        self.prefixes.iter().find(|p| p.prefix == prefix)
    }
}

/// Resets the running flag when a run ends, including on panic.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Deletes stored objects that no live row references.
///
/// Prefixes are processed sequentially. Failures are aggregated into the
/// returned report; a run never fails as a whole.
pub struct OrphanReclaimer {
    storage: Arc<dyn Storage>,
    references: Arc<dyn ReferenceLookup>,
    config: ReclaimConfig,
    running: AtomicBool,
}

impl OrphanReclaimer {
    pub fn new(
        storage: Arc<dyn Storage>,
        references: Arc<dyn ReferenceLookup>,
        mut config: ReclaimConfig,
    ) -> Self {
        config.batch_size = config.batch_size.max(1);
        config.min_age = config.min_age.max(Duration::zero());
        Self {
            storage,
            references,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ReclaimConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run a full pass unless one is already in progress.
    ///
    /// Returns `None` when skipped. Cancellation is checked between pages;
    /// whatever was not reached is left for the next run.
    pub async fn try_run(&self, token: &CancellationToken) -> Option<ReclaimReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Reclaim run already in progress, skipping");
            return None;
        }
        let _guard = RunGuard(&self.running);

        Some(self.run(token).await)
    }

    #[tracing::instrument(skip(self, token), fields(cleanup.operation = "reclaim_orphans", dry_run = self.config.dry_run))]
    async fn run(&self, token: &CancellationToken) -> ReclaimReport {
        let started_at = Utc::now();
        let Some(cutoff) = started_at.checked_sub_signed(self.config.min_age) else {
            let reason = format!("minimum age {} is out of range", self.config.min_age);
            tracing::error!(reason = %reason, "Orphaned object reclaim not started");
            return ReclaimReport {
                started_at,
                finished_at: Utc::now(),
                dry_run: self.config.dry_run,
                cancelled: false,
                total_processed: 0,
                total_deleted: 0,
                total_errors: 1,
                aborted_prefixes: 0,
                failure: Some(reason),
                prefixes: Vec::new(),
            };
        };

        tracing::info!(
            backend = %self.storage.backend_type(),
            prefixes = self.config.prefixes.len(),
            batch_size = self.config.batch_size,
            cutoff = %cutoff,
            "Starting orphaned object reclaim"
        );

        let mut prefixes = Vec::with_capacity(self.config.prefixes.len());
        let mut cancelled = false;

        for prefix in &self.config.prefixes {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }

            let report = self.reclaim_prefix(prefix, cutoff, token).await;
            if let Some(ref reason) = report.aborted {
                tracing::error!(prefix = %prefix, reason = %reason, "Prefix scan aborted");
            }
            tracing::info!(
                prefix = %prefix,
                processed = report.processed,
                orphaned = report.orphaned,
                deleted = report.deleted,
                errors = report.errors,
                failed_pages = report.failed_pages,
                "Prefix reclaim finished"
            );
            prefixes.push(report);
        }

        cancelled |= token.is_cancelled();
        let aborted_prefixes = prefixes.iter().filter(|p| p.aborted.is_some()).count();

        let report = ReclaimReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.config.dry_run,
            cancelled,
            total_processed: prefixes.iter().map(|p| p.processed).sum(),
            total_deleted: prefixes.iter().map(|p| p.deleted).sum(),
            total_errors: prefixes.iter().map(|p| p.errors + p.failed_pages).sum::<usize>()
                + aborted_prefixes,
            aborted_prefixes,
            failure: None,
            prefixes,
        };

        tracing::info!(
            total_processed = report.total_processed,
            total_deleted = report.total_deleted,
            total_errors = report.total_errors,
            aborted_prefixes = report.aborted_prefixes,
            cancelled = report.cancelled,
            duration_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Orphaned object reclaim completed"
        );

        report
    }

    async fn reclaim_prefix(
        &self,
        prefix: &str,
        cutoff: DateTime<Utc>,
        token: &CancellationToken,
    ) -> PrefixReport {
        let mut report = PrefixReport::new(prefix);
        let mut cursor = String::new();
        let mut last_key: Option<String> = None;

        loop {
            if token.is_cancelled() {
                break;
            }

            let page = match self
                .storage
                .list_batch(prefix, &cursor, self.config.batch_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    report.aborted = Some(format!("listing failed: {}", e));
                    break;
                }
            };

            let Some(last) = page.last() else {
                break;
            };

            if last_key.as_deref().is_some_and(|prev| last.key.as_str() <= prev) {
                report.aborted = Some(format!("listing cursor did not advance past {}", cursor));
                break;
            }
            let next_cursor = last.public_ref.clone();
            last_key = Some(last.key.clone());
            let page_len = page.len();

            report.scanned += page_len;
            self.reclaim_page(page, cutoff, &mut report).await;

            cursor = next_cursor;
            if page_len < self.config.batch_size {
                break;
            }
        }

        report
    }

    async fn reclaim_page(&self, page: Vec<ObjectInfo>, cutoff: DateTime<Utc>, report: &mut PrefixReport) {
        let candidates: Vec<ObjectInfo> = page
            .into_iter()
            .filter(|object| object.is_older_than(cutoff))
            .collect();
        report.processed += candidates.len();

        if candidates.is_empty() {
            return;
        }

        let refs: Vec<String> = candidates.iter().map(|o| o.public_ref.clone()).collect();
        let referenced: HashSet<String> = match self.references.find_all_referenced(&refs).await {
            Ok(referenced) => referenced,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    prefix = %report.prefix,
                    candidates = refs.len(),
                    "Reference lookup failed, skipping page"
                );
                report.failed_pages += 1;
                return;
            }
        };

        for object in candidates
            .iter()
            .filter(|o| !referenced.contains(&o.public_ref))
        {
            report.orphaned += 1;

            if self.config.dry_run {
                tracing::info!(
                    public_ref = %object.public_ref,
                    size_bytes = object.size,
                    "Orphaned object found (dry run)"
                );
                continue;
            }

            match self.storage.delete(&object.public_ref).await {
                Ok(()) => {
                    report.deleted += 1;
                    tracing::info!(
                        public_ref = %object.public_ref,
                        size_bytes = object.size,
                        "Deleted orphaned object"
                    );
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(
                        error = %e,
                        key = %object.key,
                        public_ref = %object.public_ref,
                        "Failed to delete orphaned object"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kudoboard_core::{AppError, StorageBackend};
    use kudoboard_db::OwningColumn;
    use kudoboard_storage::{ByteStream, S3Storage, StorageError, StorageResult};
    use object_store::memory::InMemory;
    use std::pin::Pin;
    use std::sync::atomic::AtomicUsize;
    use tokio::io::AsyncRead;

    const BASE: &str = "https://kudo.s3.eu-west-1.amazonaws.com";

    /// Lookup over a fixed set of referenced refs. Fails for any ref under
    /// `fail_under` when set.
    struct StaticLookup {
        referenced: HashSet<String>,
        fail_under: Option<&'static str>,
        queries: AtomicUsize,
    }

    impl StaticLookup {
        fn new(referenced: &[&str]) -> Self {
            Self {
                referenced: referenced.iter().map(|s| s.to_string()).collect(),
                fail_under: None,
                queries: AtomicUsize::new(0),
            }
        }

        fn failing_under(mut self, prefix: &'static str) -> Self {
            self.fail_under = Some(prefix);
            self
        }
    }

    #[async_trait]
    impl ReferenceLookup for StaticLookup {
        async fn find_referenced(
            &self,
            _column: &OwningColumn,
            refs: &[String],
        ) -> Result<HashSet<String>, AppError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if let Some(prefix) = self.fail_under {
                if refs.iter().any(|r| r.contains(prefix)) {
                    return Err(AppError::Internal("connection reset".to_string()));
                }
            }
            Ok(refs
                .iter()
                .filter(|r| self.referenced.contains(*r))
                .cloned()
                .collect())
        }
    }

    fn memory_storage() -> Arc<dyn Storage> {
        Arc::new(S3Storage::with_store(Arc::new(InMemory::new()), "kudo", BASE))
    }

    fn config(prefixes: &[&str], batch_size: usize) -> ReclaimConfig {
        ReclaimConfig {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            // Everything stored before the run starts counts as old enough.
            min_age: Duration::zero(),
            batch_size,
            dry_run: false,
        }
    }

    async fn put(storage: &Arc<dyn Storage>, prefix: &str, name: &str) -> ObjectInfo {
        storage
            .save(prefix, name, "", name.as_bytes().to_vec())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn deletes_only_unreferenced_objects_and_is_rerunnable() {
        let storage = memory_storage();
        let a = put(&storage, "general", "a.txt").await;
        let b = put(&storage, "general", "b.txt").await;
        let c = put(&storage, "general", "c.txt").await;

        let lookup = Arc::new(StaticLookup::new(&[a.public_ref.as_str()]));
        let reclaimer = OrphanReclaimer::new(storage.clone(), lookup, config(&["general/"], 100));
        let token = CancellationToken::new();

        let report = reclaimer.try_run(&token).await.unwrap();
        let general = report.prefix("general/").unwrap();
        assert_eq!(general.processed, 3);
        assert_eq!(general.orphaned, 2);
        assert_eq!(general.deleted, 2);
        assert!(general.is_clean());

        assert!(storage.exists(&a.public_ref).await.unwrap());
        assert!(!storage.exists(&b.public_ref).await.unwrap());
        assert!(!storage.exists(&c.public_ref).await.unwrap());

        let again = reclaimer.try_run(&token).await.unwrap();
        assert_eq!(again.total_deleted, 0);
        assert_eq!(again.total_errors, 0);
        assert_eq!(again.total_processed, 1);
    }

    #[tokio::test]
    async fn young_objects_survive_the_grace_period() {
        let storage = memory_storage();
        let fresh = put(&storage, "image/user_1", "fresh.png").await;

        let lookup = Arc::new(StaticLookup::new(&[]));
        let mut cfg = config(&["image/"], 100);
        cfg.min_age = Duration::hours(24);
        let reclaimer = OrphanReclaimer::new(storage.clone(), lookup.clone(), cfg);

        let report = reclaimer.try_run(&CancellationToken::new()).await.unwrap();
        let image = report.prefix("image/").unwrap();
        assert_eq!(image.scanned, 1);
        assert_eq!(image.processed, 0);
        assert_eq!(image.deleted, 0);
        assert!(storage.exists(&fresh.public_ref).await.unwrap());
        assert_eq!(lookup.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_failure_in_one_prefix_does_not_block_others() {
        let storage = memory_storage();
        let img = put(&storage, "image/user_1", "cat.png").await;
        let avatar = put(&storage, "avatar/anonymous", "me.png").await;

        let lookup = Arc::new(StaticLookup::new(&[]).failing_under("/image/"));
        let reclaimer =
            OrphanReclaimer::new(storage.clone(), lookup, config(&["image/", "avatar/"], 100));

        let report = reclaimer.try_run(&CancellationToken::new()).await.unwrap();

        let image = report.prefix("image/").unwrap();
        assert_eq!(image.failed_pages, 1);
        assert_eq!(image.deleted, 0);
        assert!(!image.is_clean());
        assert!(storage.exists(&img.public_ref).await.unwrap());

        let avatars = report.prefix("avatar/").unwrap();
        assert_eq!(avatars.deleted, 1);
        assert!(!storage.exists(&avatar.public_ref).await.unwrap());
        assert_eq!(report.total_errors, 1);
    }

    #[tokio::test]
    async fn pages_through_prefix_in_batches() {
        let storage = memory_storage();
        let mut keep = Vec::new();
        for i in 0..7 {
            let info = put(&storage, "gif/user_4", &format!("g{}.gif", i)).await;
            if i % 3 == 0 {
                keep.push(info.public_ref);
            }
        }

        let refs: Vec<&str> = keep.iter().map(String::as_str).collect();
        let lookup = Arc::new(StaticLookup::new(&refs));
        let reclaimer = OrphanReclaimer::new(storage.clone(), lookup, config(&["gif/"], 2));

        let report = reclaimer.try_run(&CancellationToken::new()).await.unwrap();
        let gif = report.prefix("gif/").unwrap();
        assert_eq!(gif.scanned, 7);
        assert_eq!(gif.deleted, 4);

        let remaining = storage.list_batch("gif/", "", 100).await.unwrap();
        assert_eq!(remaining.len(), 3);
    }

    #[tokio::test]
    async fn dry_run_deletes_nothing() {
        let storage = memory_storage();
        let orphan = put(&storage, "video/anonymous", "clip.mp4").await;

        let mut cfg = config(&["video/"], 100);
        cfg.dry_run = true;
        let reclaimer = OrphanReclaimer::new(storage.clone(), Arc::new(StaticLookup::new(&[])), cfg);

        let report = reclaimer.try_run(&CancellationToken::new()).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.prefix("video/").unwrap().orphaned, 1);
        assert_eq!(report.total_deleted, 0);
        assert!(storage.exists(&orphan.public_ref).await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_scanning() {
        let storage = memory_storage();
        let orphan = put(&storage, "general", "x.txt").await;
        let reclaimer = OrphanReclaimer::new(
            storage.clone(),
            Arc::new(StaticLookup::new(&[])),
            config(&["general/"], 100),
        );

        let token = CancellationToken::new();
        token.cancel();
        let report = reclaimer.try_run(&token).await.unwrap();

        assert!(report.cancelled);
        assert!(report.prefixes.is_empty());
        assert!(storage.exists(&orphan.public_ref).await.unwrap());
    }

    #[tokio::test]
    async fn listing_failure_aborts_only_that_prefix() {
        let storage = memory_storage();
        let orphan = put(&storage, "icon", "star.svg").await;
        let reclaimer = OrphanReclaimer::new(
            storage.clone(),
            Arc::new(StaticLookup::new(&[])),
            config(&["../escape/", "icon/"], 100),
        );

        let report = reclaimer.try_run(&CancellationToken::new()).await.unwrap();
        assert!(report.prefix("../escape/").unwrap().aborted.is_some());
        assert_eq!(report.prefix("icon/").unwrap().deleted, 1);
        assert_eq!(report.aborted_prefixes, 1);
        assert_eq!(report.total_errors, 1);
        assert!(!storage.exists(&orphan.public_ref).await.unwrap());
    }

    /// Returns the same full page forever.
    struct StuckStorage {
        page: Vec<ObjectInfo>,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl Storage for StuckStorage {
        async fn save(&self, _: &str, _: &str, _: &str, _: Vec<u8>) -> StorageResult<ObjectInfo> {
            Err(StorageError::Backend("read only".into()))
        }
        async fn save_from_reader(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        ) -> StorageResult<ObjectInfo> {
            Err(StorageError::Backend("read only".into()))
        }
        async fn get(&self, public_ref: &str) -> StorageResult<ByteStream> {
            Err(StorageError::NotFound(public_ref.to_string()))
        }
        async fn delete(&self, _: &str) -> StorageResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn exists(&self, _: &str) -> StorageResult<bool> {
            Ok(true)
        }
        async fn list_batch(&self, _: &str, _: &str, _: usize) -> StorageResult<Vec<ObjectInfo>> {
            Ok(self.page.clone())
        }
        fn get_url(&self, key: &str) -> String {
            format!("/uploads/{}", key)
        }
        fn resolve_key(&self, public_ref: &str) -> StorageResult<String> {
            Ok(public_ref.trim_start_matches("/uploads/").to_string())
        }
        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    #[tokio::test]
    async fn non_advancing_cursor_aborts_prefix() {
        let old = Utc::now() - Duration::days(3);
        let page = ["general/a.txt", "general/b.txt"]
            .iter()
            .map(|key| ObjectInfo {
                key: key.to_string(),
                public_ref: format!("/uploads/{}", key),
                size: 1,
                content_type: "text/plain".to_string(),
                last_modified: old,
            })
            .collect();
        let storage = Arc::new(StuckStorage {
            page,
            deletes: AtomicUsize::new(0),
        });

        let reclaimer = OrphanReclaimer::new(
            storage.clone(),
            Arc::new(StaticLookup::new(&[])),
            config(&["general/"], 2),
        );

        let report = reclaimer.try_run(&CancellationToken::new()).await.unwrap();
        let general = report.prefix("general/").unwrap();
        assert!(general.aborted.as_deref().unwrap().contains("did not advance"));
        assert_eq!(general.scanned, 2);
        assert_eq!(storage.deletes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn overlapping_run_is_skipped() {
        let reclaimer = OrphanReclaimer::new(
            memory_storage(),
            Arc::new(StaticLookup::new(&[])),
            config(&["general/"], 100),
        );

        reclaimer.running.store(true, Ordering::Release);
        assert!(reclaimer.try_run(&CancellationToken::new()).await.is_none());

        reclaimer.running.store(false, Ordering::Release);
        assert!(reclaimer.try_run(&CancellationToken::new()).await.is_some());
        assert!(!reclaimer.is_running());
    }

    #[test]
    fn negative_min_age_is_floored_at_zero() {
        let mut cfg = config(&["general/"], 100);
        cfg.min_age = Duration::hours(-1);
        let reclaimer = OrphanReclaimer::new(memory_storage(), Arc::new(StaticLookup::new(&[])), cfg);
        assert_eq!(reclaimer.config().min_age, Duration::zero());

        let settings = ReclaimSettings {
            enabled: true,
            min_age_hours: -5,
            batch_size: 10,
            run_at: chrono::NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        };
        assert_eq!(ReclaimConfig::from_settings(&settings).min_age, Duration::zero());
    }

    #[tokio::test]
    async fn out_of_range_min_age_fails_the_run_without_deleting() {
        let storage = memory_storage();
        let orphan = put(&storage, "general", "old.txt").await;

        let mut cfg = config(&["general/"], 100);
        cfg.min_age = Duration::MAX;
        let reclaimer = OrphanReclaimer::new(storage.clone(), Arc::new(StaticLookup::new(&[])), cfg);

        let report = reclaimer.try_run(&CancellationToken::new()).await.unwrap();
        assert!(report.failure.as_deref().unwrap().contains("out of range"));
        assert_eq!(report.total_errors, 1);
        assert!(report.prefixes.is_empty());
        assert!(storage.exists(&orphan.public_ref).await.unwrap());
        assert!(!reclaimer.is_running());
    }

    #[test]
    fn oversized_settings_are_capped_to_a_year() {
        let settings = ReclaimSettings {
            enabled: true,
            min_age_hours: 10_000_000_000,
            batch_size: 10,
            run_at: chrono::NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        };
        assert_eq!(
            ReclaimConfig::from_settings(&settings).min_age,
            Duration::hours(MAX_RECLAIM_MIN_AGE_HOURS)
        );
    }

    #[test]
    fn default_config_scans_every_category() {
        let cfg = ReclaimConfig::default();
        assert_eq!(cfg.prefixes.len(), Category::ALL.len());
        assert!(cfg.prefixes.contains(&"posts/".to_string()));
        assert_eq!(cfg.prefixes[0], "image/");
        assert_eq!(cfg.min_age, Duration::hours(24));
        assert_eq!(cfg.batch_size, 100);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = ReclaimReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            dry_run: false,
            cancelled: false,
            total_processed: 1,
            total_deleted: 1,
            total_errors: 0,
            aborted_prefixes: 0,
            failure: None,
            prefixes: vec![PrefixReport::new("general/")],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["prefixes"][0]["prefix"], "general/");
        assert_eq!(json["total_deleted"], 1);
    }
}
