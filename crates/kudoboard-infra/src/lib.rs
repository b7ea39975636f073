//! Kudoboard Infrastructure Library
//!
//! This crate provides the background components shared by Kudoboard services:
//! - Telemetry initialization
//! - Orphaned object reclamation and its daily scheduler

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "cleanup")]
pub mod cleanup;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "cleanup")]
pub use cleanup::{
    next_run_after, OrphanReclaimer, PrefixReport, ReclaimConfig, ReclaimReport, ReclaimScheduler,
};
