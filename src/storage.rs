//! The storage collaborator.
//!
//! Engines never touch storage. A caller reads text, runs an engine, and
//! writes the result back through a [`Storage`] implementation.

use crate::document::fingerprint;
use crate::safety::{SafetyError, WorkspaceGuard};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("{path} changed since it was read (expected fingerprint {expected:016x}, found {found:016x})")]
    Stale {
        path: PathBuf,
        expected: u64,
        found: u64,
    },

    #[error("file is not valid UTF-8: {0}")]
    NotUtf8(PathBuf),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait Storage {
    fn read(&self, path: &Path) -> Result<String, StorageError>;

    fn write(&self, path: &Path, text: &str) -> Result<(), StorageError>;

    /// Write only if the stored text still hashes to `expected`.
    ///
    /// Guards against another writer landing between the read a batch was
    /// computed from and this write.
    fn write_if_unchanged(
        &self,
        path: &Path,
        text: &str,
        expected: u64,
    ) -> Result<(), StorageError> {
        let found = fingerprint(&self.read(path)?);
        if found != expected {
            return Err(StorageError::Stale {
                path: path.to_path_buf(),
                expected,
                found,
            });
        }
        self.write(path, text)
    }
}

impl<T: Storage + ?Sized> Storage for &T {
    fn read(&self, path: &Path) -> Result<String, StorageError> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StorageError> {
        (**self).write(path, text)
    }
}

/// Files on disk below a workspace root.
#[derive(Debug, Clone)]
pub struct FsStorage {
    guard: WorkspaceGuard,
}

impl FsStorage {
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self {
            guard: WorkspaceGuard::new(workspace_root)?,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        self.guard.workspace_root()
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, StorageError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.guard.workspace_root().join(path)
        };
        if !absolute.exists() {
            return Err(StorageError::NotFound(absolute));
        }
        Ok(self.guard.validate_path(absolute)?)
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<String, StorageError> {
        let resolved = self.resolve(path)?;
        let bytes = fs::read(&resolved).map_err(|source| StorageError::Io {
            path: resolved.clone(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|_| StorageError::NotUtf8(resolved))
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StorageError> {
        // Re-resolve right before writing so a swapped-in symlink is caught.
        let resolved = self.resolve(path)?;
        atomic_write(&resolved, text.as_bytes()).map_err(|source| StorageError::Io {
            path: resolved,
            source,
        })
    }
}

/// Atomic file write: tempfile in the same directory, fsync, rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        )
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original permissions; a fresh tempfile is 0600.
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// In-memory storage for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RefCell<BTreeMap<PathBuf, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.borrow_mut().insert(path.into(), text.into());
        self
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &Path) -> Result<String, StorageError> {
        self.get(path)
            .ok_or_else(|| StorageError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StorageError> {
        let mut files = self.files.borrow_mut();
        match files.get_mut(path) {
            Some(existing) => {
                *existing = text.to_string();
                Ok(())
            }
            None => Err(StorageError::NotFound(path.to_path_buf())),
        }
    }
}
