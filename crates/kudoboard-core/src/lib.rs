//! Kudoboard Core Library
//!
//! This crate provides the domain types, error types and configuration shared by
//! the storage layer, the reference repository and the orphan reclaimer.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, LogFormat, ReclaimSettings, StorageSettings};
pub use error::AppError;
pub use models::{Category, ObjectInfo};
pub use storage_types::StorageBackend;
