use crate::fs::Filesystem;
use crate::StoreError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default snapshot file name, relative to the working directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "kyml-snapshot.diff";

/// Persisted copy of the last approved diff between two environments.
///
/// The file holds the verbatim unified diff text. A missing file is a
/// normal state (no snapshot recorded yet) and loads as `None`.
pub struct SnapshotStore<'a> {
    fs: &'a dyn Filesystem,
    path: PathBuf,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(fs: &'a dyn Filesystem, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>, StoreError> {
        if !self.fs.exists(&self.path) {
            debug!("no snapshot at {}", self.path.display());
            return Ok(None);
        }
        match self.fs.read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the snapshot with `diff`.
    pub fn save(&self, diff: &str) -> Result<(), StoreError> {
        self.fs.write(&self.path, diff.as_bytes())
    }
}
