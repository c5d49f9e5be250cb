//! Filesystem access and snapshot persistence for kyml.
//!
//! This crate provides the storage layer: a narrow `Filesystem` capability
//! with an OS-backed implementation (atomic whole-file writes) and an
//! in-memory double for tests, plus `SnapshotStore`, which persists the
//! last approved diff between two environments.

pub mod fs;
pub mod snapshot;

pub use fs::{Filesystem, MemoryFilesystem, OsFilesystem};
pub use snapshot::{SnapshotStore, DEFAULT_SNAPSHOT_FILE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("filesystem lock poisoned: {0}")]
    LockPoisoned(String),
}
