use crate::StoreError;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Minimal file access used by the manifest pipeline and snapshot store.
pub trait Filesystem {
    /// Open a file for streaming reads.
    fn open(&self, path: &Path) -> Result<Box<dyn Read + '_>, StoreError>;

    fn read_to_string(&self, path: &Path) -> Result<String, StoreError>;

    /// Replace the whole file content.
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError>;

    fn exists(&self, path: &Path) -> bool;
}

/// Filesystem backed by the operating system.
///
/// Writes go through a `NamedTempFile` in the target directory and are
/// renamed into place, so readers never observe a half-written file.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl OsFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for OsFilesystem {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + '_>, StoreError> {
        let file = fs::File::open(path).map_err(|e| not_found_or_io(path, e))?;
        Ok(Box::new(file))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, StoreError> {
        fs::read_to_string(path).map_err(|e| not_found_or_io(path, e))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let existing_permissions = fs::metadata(path).map(|m| m.permissions()).ok();

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        match existing_permissions {
            Some(perms) => tmp.as_file().set_permissions(perms)?,
            None => set_default_permissions(tmp.as_file())?,
        }
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> Result<(), std::io::Error> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> Result<(), std::io::Error> {
    Ok(())
}

fn not_found_or_io(path: &Path, e: std::io::Error) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::NotFound(path.display().to_string())
    } else {
        StoreError::Io(e)
    }
}

/// In-memory filesystem for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper to seed a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> Self {
        if let Ok(files) = self.files.get_mut() {
            files.insert(path.into(), data.into());
        }
        self
    }

    /// Preload real files from disk, keyed by the path they were read from.
    pub fn from_disk<P: AsRef<Path>>(paths: &[P]) -> Result<Self, StoreError> {
        let mut files = BTreeMap::new();
        for path in paths {
            let path = path.as_ref();
            let data = fs::read(path).map_err(|e| not_found_or_io(path, e))?;
            files.insert(path.to_path_buf(), data);
        }
        Ok(Self {
            files: Mutex::new(files),
        })
    }

    fn get(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let files = self
            .files
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.display().to_string()))
    }
}

impl Filesystem for MemoryFilesystem {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + '_>, StoreError> {
        Ok(Box::new(Cursor::new(self.get(path)?)))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, StoreError> {
        let data = self.get(path)?;
        String::from_utf8(data)
            .map_err(|e| StoreError::Io(std::io::Error::new(ErrorKind::InvalidData, e)))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let mut files = self
            .files
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}
