//! Data models shared across the storage layer and the reclaimer.

mod category;
mod storage;

pub use category::*;
pub use storage::*;
