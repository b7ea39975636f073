//! Orphaned object reclamation
//!
//! [`OrphanReclaimer`] deletes stored objects no live row references;
//! [`ReclaimScheduler`] runs it once a day.

mod reclaimer;
mod scheduler;

pub use reclaimer::{OrphanReclaimer, PrefixReport, ReclaimConfig, ReclaimReport};
pub use scheduler::{next_run_after, ReclaimScheduler};
