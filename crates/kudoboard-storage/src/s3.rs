use crate::keys::{generate_key, guess_content_type, validate_key, validate_prefix};
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::{ObjectInfo, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt};

const DELETE_CONFIRM_ATTEMPTS: u32 = 10;
const DELETE_CONFIRM_INTERVAL: Duration = Duration::from_millis(200);

/// Connection settings for [`S3Storage::new`].
#[derive(Clone, Debug, Default)]
pub struct S3Options {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO etc.); enables path-style URLs.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Overrides the base of constructed public URLs (e.g. a CDN).
    pub public_url: Option<String>,
}

impl S3Options {
    /// Base of public URLs, without trailing slash.
    ///
    /// AWS: `https://{bucket}.s3.{region}.amazonaws.com`; custom endpoints use
    /// path style `{endpoint}/{bucket}`.
    pub fn base_url(&self) -> String {
        if let Some(ref public_url) = self.public_url {
            public_url.trim_end_matches('/').to_string()
        } else if let Some(ref endpoint) = self.endpoint {
            format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket)
        } else {
            format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region)
        }
    }
}

/// S3 storage implementation
///
/// Works over any [`ObjectStore`]; production builds an `AmazonS3` client.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    base_url: String,
}

impl S3Storage {
    /// Create a new S3Storage instance from connection settings.
    ///
    /// Credentials fall back to the ambient AWS environment when not given.
    pub fn new(options: S3Options) -> StorageResult<Self> {
        if options.bucket.is_empty() {
            return Err(StorageError::Config("S3 bucket is empty".to_string()));
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_region(options.region.clone())
            .with_bucket_name(options.bucket.clone());

        if let (Some(access_key), Some(secret_key)) = (&options.access_key, &options.secret_key) {
            builder = builder
                .with_access_key_id(access_key.clone())
                .with_secret_access_key(secret_key.clone());
        }

        if let Some(ref endpoint) = options.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_virtual_hosted_style_request(false)
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self::with_store(
            Arc::new(store),
            options.bucket.clone(),
            options.base_url(),
        ))
    }

    /// Wrap an existing object store.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        S3Storage {
            store,
            bucket: bucket.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn object_info(&self, meta: ObjectMeta) -> ObjectInfo {
        let key = meta.location.to_string();
        ObjectInfo {
            public_ref: self.get_url(&key),
            content_type: guess_content_type(&key),
            size: meta.size,
            last_modified: meta.last_modified,
            key,
        }
    }

    /// Poll until the object is no longer visible.
    async fn wait_until_absent(&self, location: &Path, key: &str) -> StorageResult<()> {
        for attempt in 0..DELETE_CONFIRM_ATTEMPTS {
            match self.store.head(location).await {
                Err(ObjectStoreError::NotFound { .. }) => return Ok(()),
                Err(e) => return Err(map_error(e, key)),
                Ok(_) => {
                    tracing::debug!(key = %key, attempt, "S3 object still visible after delete");
                    tokio::time::sleep(DELETE_CONFIRM_INTERVAL).await;
                }
            }
        }

        Err(StorageError::Transient(format!(
            "Object {} still visible after delete",
            key
        )))
    }
}

/// Translate object store errors into the storage taxonomy.
fn map_error(err: ObjectStoreError, key: &str) -> StorageError {
    match err {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::Unauthorized(err.to_string())
        }
        ObjectStoreError::Generic { .. } => StorageError::Transient(err.to_string()),
        other => StorageError::Backend(other.to_string()),
    }
}

fn content_type_attributes(key: &str, content_type: &str) -> Attributes {
    let content_type = if content_type.is_empty() {
        guess_content_type(key)
    } else {
        content_type.to_string()
    };
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.into());
    attributes
}

#[async_trait]
impl Storage for S3Storage {
    async fn save(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<ObjectInfo> {
        let key = generate_key(prefix, filename)?;
        let size = data.len() as u64;
        let location = Path::from(key.clone());
        let opts = PutOptions {
            attributes: content_type_attributes(&key, content_type),
            ..Default::default()
        };

        let start = std::time::Instant::now();

        self.store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), opts)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                map_error(e, &key)
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(ObjectInfo {
            public_ref: self.get_url(&key),
            content_type: if content_type.is_empty() {
                guess_content_type(&key)
            } else {
                content_type.to_string()
            },
            size,
            last_modified: Utc::now(),
            key,
        })
    }

    async fn save_from_reader(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<ObjectInfo> {
        let key = generate_key(prefix, filename)?;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let mut writer = BufWriter::new(Arc::clone(&self.store), location.clone())
            .with_attributes(content_type_attributes(&key, content_type));

        let copied = async {
            let copied = tokio::io::copy(&mut reader, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<u64, std::io::Error>(copied)
        }
        .await;

        let copied = match copied {
            Ok(n) => n,
            Err(e) => {
                let _ = writer.abort().await;
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload failed"
                );
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        // The stream length is only known remotely once the upload completes.
        let meta = self
            .store
            .head(&location)
            .await
            .map_err(|e| map_error(e, &key))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = meta.size,
            bytes_read = copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 stream upload successful"
        );

        let mut info = self.object_info(meta);
        if !content_type.is_empty() {
            info.content_type = content_type.to_string();
        }
        Ok(info)
    }

    async fn get(&self, public_ref: &str) -> StorageResult<ByteStream> {
        let key = self.resolve_key(public_ref)?;
        let location = Path::from(key.clone());

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(public_ref.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 download failed"
                );
                map_error(other, &key)
            }
        })?;

        let bucket = self.bucket.clone();
        let stream = result.into_stream().map(move |res| {
            res.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    "S3 stream download error"
                );
                StorageError::DownloadFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, public_ref: &str) -> StorageResult<()> {
        let key = match self.resolve_key(public_ref) {
            Ok(key) => key,
            Err(StorageError::InvalidKey(reason)) => {
                tracing::debug!(public_ref = %public_ref, reason = %reason, "S3 delete: invalid key, nothing to delete");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(map_error(e, &key));
            }
        }

        self.wait_until_absent(&location, &key).await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, public_ref: &str) -> StorageResult<bool> {
        let key = self.resolve_key(public_ref)?;
        let location = Path::from(key.clone());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(map_error(e, &key)),
        }
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

        let trimmed = prefix.trim_matches('/');
        let prefix_path = (!trimmed.is_empty()).then(|| Path::from(trimmed));
        let start = std::time::Instant::now();

        let listing = if start_after.is_empty() {
            self.store.list(prefix_path.as_ref())
        } else {
            let offset = Path::from(self.resolve_key(start_after)?);
            self.store.list_with_offset(prefix_path.as_ref(), &offset)
        };

        let metas: Vec<ObjectMeta> = listing
            .take(page_size)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    prefix = %prefix,
                    start_after = %start_after,
                    "S3 list failed"
                );
                map_error(e, prefix)
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            returned = metas.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list batch"
        );

        Ok(metas.into_iter().map(|meta| self.object_info(meta)).collect())
    }

    fn get_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn resolve_key(&self, public_ref: &str) -> StorageResult<String> {
        let own_prefix = format!("{}/", self.base_url);
        let key = if let Some(rest) = public_ref.strip_prefix(&own_prefix) {
            rest
        } else if public_ref.starts_with("http://") || public_ref.starts_with("https://") {
            return Err(StorageError::Config(format!(
                "URL does not belong to bucket {}: {}",
                self.bucket, public_ref
            )));
        } else if public_ref.starts_with('/') {
            return Err(StorageError::Config(format!(
                "Local path passed to S3 storage: {}",
                public_ref
            )));
        } else {
            public_ref
        };

        validate_key(key)?;
        Ok(key.to_string())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(all(test, feature = "storage-s3"))]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    const BASE: &str = "https://kudo.s3.eu-west-1.amazonaws.com";

    fn storage() -> S3Storage {
        S3Storage::with_store(Arc::new(InMemory::new()), "kudo", BASE)
    }

    #[test]
    fn base_url_variants() {
        let aws = S3Options {
            bucket: "kudo".into(),
            region: "eu-west-1".into(),
            ..Default::default()
        };
        assert_eq!(aws.base_url(), BASE);

        let minio = S3Options {
            endpoint: Some("http://localhost:9000/".into()),
            ..aws.clone()
        };
        assert_eq!(minio.base_url(), "http://localhost:9000/kudo");

        let cdn = S3Options {
            public_url: Some("https://cdn.example.com/".into()),
            ..aws
        };
        assert_eq!(cdn.base_url(), "https://cdn.example.com");
    }

    #[tokio::test]
    async fn save_returns_reconstructible_url() {
        let storage = storage();
        let info = storage
            .save("general", "note.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();

        assert_eq!(info.size, 5);
        assert!(info.public_ref.starts_with(&format!("{}/general/note-", BASE)));
        assert_eq!(info.public_ref, storage.get_url(&info.key));
        assert_eq!(storage.resolve_key(&info.public_ref).unwrap(), info.key);
        assert_eq!(storage.get_bytes(&info.public_ref).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_confirmed() {
        let storage = storage();
        let info = storage
            .save("gif/user_2", "dance.gif", "image/gif", vec![1, 2, 3])
            .await
            .unwrap();

        storage.delete(&info.public_ref).await.unwrap();
        assert!(!storage.exists(&info.public_ref).await.unwrap());
        storage.delete(&info.public_ref).await.unwrap();

        let err = storage.get(&info.public_ref).await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_of_invalid_ref_succeeds() {
        let storage = storage();
        storage.delete("").await.unwrap();
        storage.delete("../general/a.txt").await.unwrap();

        let err = storage.delete("/uploads/general/a.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[tokio::test]
    async fn stream_upload_reports_remote_size() {
        let storage = storage();
        let payload: Vec<u8> = (0..=255u8).cycle().take(40_000).collect();
        let reader = Box::pin(std::io::Cursor::new(payload.clone()))
            as Pin<Box<dyn AsyncRead + Send + Unpin>>;

        let info = storage
            .save_from_reader("video/anonymous", "clip.mp4", "video/mp4", reader)
            .await
            .unwrap();

        assert_eq!(info.size, payload.len() as u64);
        assert_eq!(info.content_type, "video/mp4");
        assert_eq!(storage.get_bytes(&info.public_ref).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn pagination_resumes_after_cursor() {
        let storage = storage();
        for i in 0..5u8 {
            storage
                .save("avatar/user_1", &format!("a{}.png", i), "image/png", vec![i])
                .await
                .unwrap();
        }
        storage
            .save("general", "other.txt", "text/plain", vec![0])
            .await
            .unwrap();

        let first = storage.list_batch("avatar/", "", 2).await.unwrap();
        assert_eq!(first.len(), 2);
        let second = storage
            .list_batch("avatar/", &first[1].public_ref, 2)
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
        let third = storage.list_batch("avatar/", &second[1].key, 2).await.unwrap();
        assert_eq!(third.len(), 1);

        let mut keys: Vec<String> = first
            .iter()
            .chain(&second)
            .chain(&third)
            .map(|o| o.key.clone())
            .collect();
        let total = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert!(keys.iter().all(|k| k.starts_with("avatar/user_1/")));
        assert_eq!(third[0].content_type, "image/png");
    }

    #[test]
    fn foreign_refs_are_configuration_errors() {
        let storage = storage();
        assert!(matches!(
            storage.resolve_key("/uploads/general/note.txt"),
            Err(StorageError::Config(_))
        ));
        assert!(matches!(
            storage.resolve_key("https://other.s3.us-east-1.amazonaws.com/general/note.txt"),
            Err(StorageError::Config(_))
        ));
        assert_eq!(
            storage.resolve_key("general/note.txt").unwrap(),
            "general/note.txt"
        );
    }

    #[test]
    fn error_mapping_distinguishes_failure_kinds() {
        let not_found = ObjectStoreError::NotFound {
            path: "a".into(),
            source: "missing".into(),
        };
        assert!(map_error(not_found, "a").is_not_found());

        let generic = ObjectStoreError::Generic {
            store: "S3",
            source: "connection reset".into(),
        };
        assert!(map_error(generic, "a").is_retryable());

        let denied = ObjectStoreError::PermissionDenied {
            path: "a".into(),
            source: "forbidden".into(),
        };
        assert!(matches!(
            map_error(denied, "a"),
            StorageError::Unauthorized(_)
        ));
    }
}
