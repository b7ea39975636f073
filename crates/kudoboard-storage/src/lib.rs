//! Kudoboard Storage Library
//!
//! This crate provides the blob storage abstraction used by uploads and by the
//! orphan reclaimer. It includes the `Storage` trait and implementations for the
//! local filesystem and S3-compatible object stores.
//!
//! # Key format
//!
//! All backends share one key layout:
//!
//! - **Owned categories**: `{category}/user_{id}/{generated-filename}` or
//!   `{category}/anonymous/{generated-filename}`
//! - **Shared categories** (`general`, `theme`, `icon`): `{category}/{generated-filename}`
//!
//! Generated file names have the form `{name}-{YYYYMMDDHHMMSS}-{8 hex chars}{ext}`.
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module so all backends stay consistent.
//!
//! # Public references
//!
//! Every object is addressed from outside the backend by its `public_ref`: a
//! `/uploads/...` path for the local backend, a full URL for S3. `Storage::get_url`
//! builds it from a key and `Storage::resolve_key` is its exact inverse.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use kudoboard_core::{Category, ObjectInfo, StorageBackend};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
