use crate::keys::{generate_key, guess_content_type, validate_key, validate_prefix};
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::{ObjectInfo, StorageBackend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use kudoboard_core::constants::LOCAL_STAGING_DIR;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Objects live at `{root}/{key}` and are addressed as `{url_prefix}/{key}`.
/// Uploads are written to `{root}/.staging` first and renamed into place, so
/// a partially written file is never listed or served.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `root` - Root directory for file storage (e.g., "./uploads")
    /// * `url_prefix` - Path prefix of public references (e.g., "/uploads")
    pub async fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> StorageResult<Self> {
        let root = root.into();
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();

        if !url_prefix.starts_with('/') {
            return Err(StorageError::Config(format!(
                "Local URL prefix must start with '/': {}",
                url_prefix
            )));
        }

        fs::create_dir_all(root.join(LOCAL_STAGING_DIR))
            .await
            .map_err(|e| {
                StorageError::Config(format!(
                    "Failed to create storage directory {}: {}",
                    root.display(),
                    e
                ))
            })?;

        Ok(LocalStorage { root, url_prefix })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert a validated key to a filesystem path
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        if key.split('/').any(|segment| segment.starts_with('.')) {
            return Err(StorageError::InvalidKey(format!(
                "Storage key contains a hidden segment: {}",
                key
            )));
        }
        Ok(self.root.join(key))
    }

    fn staging_path(&self) -> PathBuf {
        self.root
            .join(LOCAL_STAGING_DIR)
            .join(Uuid::new_v4().simple().to_string())
    }

    /// Move a fully written staging file to its final location.
    async fn publish(&self, staging: &Path, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(parent, e))?;
        }
        fs::rename(staging, path)
            .await
            .map_err(|e| write_error(path, e))
    }

    async fn object_info(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<ObjectInfo> {
        let meta = fs::metadata(path).await?;
        let last_modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let content_type = if content_type.is_empty() {
            guess_content_type(key)
        } else {
            content_type.to_string()
        };

        Ok(ObjectInfo {
            key: key.to_string(),
            public_ref: self.get_url(key),
            size: meta.len(),
            content_type,
            last_modified,
        })
    }

    /// Collect every visible key below `dir`, relative to the root.
    async fn walk(&self, dir: PathBuf) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![dir];

        while let Some(current) = pending.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if name.to_string_lossy().starts_with('.') {
                    continue;
                }
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        keys.push(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }

        Ok(keys)
    }
}

fn write_error(path: &Path, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::QuotaExceeded => {
            StorageError::QuotaExceeded(format!("{}: {}", path.display(), e))
        }
        _ => StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e)),
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<ObjectInfo> {
        let key = generate_key(prefix, filename)?;
        let path = self.key_to_path(&key)?;
        let staging = self.staging_path();
        let size = data.len();
        let start = std::time::Instant::now();

        let written: StorageResult<()> = async {
            let mut file = fs::File::create(&staging)
                .await
                .map_err(|e| write_error(&staging, e))?;
            file.write_all(&data)
                .await
                .map_err(|e| write_error(&staging, e))?;
            file.sync_all()
                .await
                .map_err(|e| write_error(&staging, e))?;
            self.publish(&staging, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&staging).await;
            tracing::error!(
                error = %e,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage save failed"
            );
            return Err(e);
        }

        let info = self.object_info(&key, &path, content_type).await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage save successful"
        );

        Ok(info)
    }

    async fn save_from_reader(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<ObjectInfo> {
        let key = generate_key(prefix, filename)?;
        let path = self.key_to_path(&key)?;
        let staging = self.staging_path();
        let start = std::time::Instant::now();

        let written: StorageResult<u64> = async {
            let mut file = fs::File::create(&staging)
                .await
                .map_err(|e| write_error(&staging, e))?;
            let copied = tokio::io::copy(&mut reader, &mut file)
                .await
                .map_err(|e| write_error(&staging, e))?;
            file.sync_all()
                .await
                .map_err(|e| write_error(&staging, e))?;
            self.publish(&staging, &path).await?;
            Ok(copied)
        }
        .await;

        let bytes_copied = match written {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                tracing::error!(
                    error = %e,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream save failed"
                );
                return Err(e);
            }
        };

        let info = self.object_info(&key, &path, content_type).await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream save successful"
        );

        Ok(info)
    }

    async fn get(&self, public_ref: &str) -> StorageResult<ByteStream> {
        let key = self.resolve_key(public_ref)?;
        let path = self.key_to_path(&key)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(public_ref.to_string()));
            }
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Local storage open failed");
                return Err(StorageError::Io(e));
            }
        };

        let path_display = path.display().to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    error = %e,
                    path = %path_display,
                    key = %key,
                    "Local storage stream read error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, public_ref: &str) -> StorageResult<()> {
        // Nothing can be stored under an invalid key, so there is nothing to delete.
        // Foreign reference formats still fail.
        let resolved = self
            .resolve_key(public_ref)
            .and_then(|key| self.key_to_path(&key).map(|path| (key, path)));
        let (key, path) = match resolved {
            Ok(resolved) => resolved,
            Err(StorageError::InvalidKey(reason)) => {
                tracing::debug!(public_ref = %public_ref, reason = %reason, "Local storage delete: invalid key, nothing to delete");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Local storage delete: already absent");
                return Ok(());
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage delete failed"
                );
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, public_ref: &str) -> StorageResult<bool> {
        let key = self.resolve_key(public_ref)?;
        let path = self.key_to_path(&key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list_batch(
        &self,
        prefix: &str,
        start_after: &str,
        page_size: usize,
    ) -> StorageResult<Vec<ObjectInfo>> {
        validate_prefix(prefix)?;
        if page_size == 0 {
            return Ok(Vec::new());
        }

        let cursor = if start_after.is_empty() {
            None
        } else {
            Some(self.resolve_key(start_after)?)
        };

        let dir = self.root.join(prefix.trim_matches('/'));
        let mut keys = self.walk(dir).await?;
        keys.sort_unstable();

        let selected: Vec<String> = keys
            .into_iter()
            .filter(|key| cursor.as_deref().map_or(true, |c| key.as_str() > c))
            .take(page_size)
            .collect();

        let mut page = Vec::with_capacity(selected.len());
        for key in selected {
            let path = self.root.join(&key);
            match self.object_info(&key, &path, "").await {
                Ok(info) => page.push(info),
                // Deleted between the walk and the stat.
                Err(StorageError::Io(e)) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            prefix = %prefix,
            start_after = %start_after,
            returned = page.len(),
            "Local storage list batch"
        );

        Ok(page)
    }

    fn get_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key.replace('\\', "/"))
    }

    fn resolve_key(&self, public_ref: &str) -> StorageResult<String> {
        if public_ref.starts_with("http://") || public_ref.starts_with("https://") {
            return Err(StorageError::Config(format!(
                "Object store URL passed to local storage: {}",
                public_ref
            )));
        }

        let own_prefix = format!("{}/", self.url_prefix);
        let key = if let Some(rest) = public_ref.strip_prefix(&own_prefix) {
            rest
        } else if public_ref.starts_with('/') {
            return Err(StorageError::Config(format!(
                "Reference is outside {}: {}",
                self.url_prefix, public_ref
            )));
        } else {
            public_ref
        };

        validate_key(key)?;
        Ok(key.to_string())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
