use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{ArtifactPath, ArtifactStore};
use crate::core::StorageError;

/// Filesystem store rooted at a directory.
///
/// Writes go to a temporary sibling which is synced and then renamed over
/// the target, so readers see either the old or the new artifact.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `path` below the root.
    pub fn resolve(&self, path: &ArtifactPath) -> PathBuf {
        self.root.join(path.directory()).join(path.file_name())
    }

    fn write_synced(tmp: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(tmp).map_err(|e| StorageError::io(tmp, e))?;
        file.write_all(bytes).map_err(|e| StorageError::io(tmp, e))?;
        file.sync_all().map_err(|e| StorageError::io(tmp, e))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, path: &ArtifactPath, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path);
        let dir = self.root.join(path.directory());
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let tmp = dir.join(format!(".{}.tmp", path.file_name()));
        let written = Self::write_synced(&tmp, bytes)
            .and_then(|()| fs::rename(&tmp, &target).map_err(|e| StorageError::io(&target, e)));
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written?;

        tracing::debug!(path = %path, bytes = bytes.len(), "artifact stored");
        Ok(())
    }

    fn get(&self, path: &ArtifactPath) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path);
        fs::read(&target).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.relative()),
            _ => StorageError::io(&target, e),
        })
    }

    fn exists(&self, path: &ArtifactPath) -> bool {
        self.resolve(path).is_file()
    }
}
