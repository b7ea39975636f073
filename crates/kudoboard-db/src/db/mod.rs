//! Database repositories for data access layer
//
// Connection pool setup
pub mod pool;
//
// Owning-reference registry and lookups
pub mod references;

pub use pool::create_pool;
pub use references::{OwningColumn, ReferenceLookup, ReferenceRepository, OWNING_COLUMNS};
