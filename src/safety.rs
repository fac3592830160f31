//! Workspace confinement for file edits.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directories under the workspace root whose files are never edited.
const PROTECTED_DIRS: &[&str] = &[".git", "target"];

/// Confines storage access to regular files below one workspace directory.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    root: PathBuf,
    /// Canonical protected directories that exist on disk
    protected: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("{path} is outside the workspace {root}")]
    OutsideWorkspace { path: PathBuf, root: PathBuf },

    #[error("{path} is inside protected directory {dir}")]
    Protected { path: PathBuf, dir: PathBuf },

    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),

    #[error("cannot resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn resolve(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize().map_err(|source| SafetyError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

impl WorkspaceGuard {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = resolve(root.as_ref())?;
        let protected = PROTECTED_DIRS
            .iter()
            .filter_map(|dir| root.join(dir).canonicalize().ok())
            .collect();
        Ok(Self { root, protected })
    }

    /// Resolve `path` against the workspace root, following symlinks, and
    /// return the canonical path of the file it names.
    ///
    /// Only existing regular files pass; the engines never create files.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let joined = self.root.join(path.as_ref());
        let canonical = resolve(&joined)?;

        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical,
                root: self.root.clone(),
            });
        }
        if let Some(dir) = self.protected.iter().find(|dir| canonical.starts_with(dir)) {
            return Err(SafetyError::Protected {
                path: canonical,
                dir: dir.clone(),
            });
        }
        if !canonical.is_file() {
            return Err(SafetyError::NotAFile(canonical));
        }

        Ok(canonical)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.root
    }
}
