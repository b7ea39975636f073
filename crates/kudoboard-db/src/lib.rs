//! Kudoboard database access
//!
//! Read-only queries the orphan reclaimer needs against the application schema:
//! the registry of columns that can hold a storage reference and bulk membership
//! checks over them.

pub mod db;

pub use db::{
    create_pool, OwningColumn, ReferenceLookup, ReferenceRepository, OWNING_COLUMNS,
};
