//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong on disk:
//! - `SheetLocks` - per-user mutexes around document updates

pub mod sheet_locks;

pub use sheet_locks::SheetLocks;
