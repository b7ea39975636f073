//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::{ObjectInfo, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Storage access denied: {0}")]
    Unauthorized(String),

    #[error("Transient storage error: {0}")]
    Transient(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Whether the same call may succeed if issued again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of object content chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) implement this trait, so upload
/// handlers and the reclaimer never depend on a concrete backend.
///
/// Methods taking a `public_ref` accept whatever `save` returned for this backend
/// (and bare keys). A reference in another backend's format is a `Config` error.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under a freshly generated key below `prefix`.
    ///
    /// The object is either fully stored or not visible at all.
    async fn save(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<ObjectInfo>;

    /// Store a file from a reader of unknown length.
    ///
    /// The reader is consumed until EOF and the size is discovered during the copy.
    async fn save_from_reader(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<ObjectInfo>;

    /// Open an object for reading. Missing objects yield `StorageError::NotFound`.
    async fn get(&self, public_ref: &str) -> StorageResult<ByteStream>;

    /// Read a whole object into memory.
    async fn get_bytes(&self, public_ref: &str) -> StorageResult<Vec<u8>> {
        let stream = self.get(public_ref).await?;
        let chunks: Vec<Bytes> = stream.try_collect().await?;
        Ok(chunks.concat())
    }

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, public_ref: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, public_ref: &str) -> StorageResult<bool>;

    /// List up to `page_size` objects under `prefix`, ordered by key, strictly
    /// after `start_after` (a key or public ref; empty means from the start).
    async fn list_batch(
        &self,
        prefix: &str,
        start_after: &str,
        page_size: usize,
    ) -> StorageResult<Vec<ObjectInfo>>;

    /// Build the public reference for a key. Pure; no I/O.
    fn get_url(&self, key: &str) -> String;

    /// Normalize a public reference back to a backend key.
    fn resolve_key(&self, public_ref: &str) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
