//! FeedX upload adapter.
//!
//! Implements the [`domain::FileStore`] port on the local file system. The
//! upload policy (allowed types, folder, file name) is decided by
//! [`domain::uploads::plan_upload`]; this crate only writes bytes under its
//! root directory and refuses paths that would escape it.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.**

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use domain::{FileStore, StoreError};
use thiserror::Error;
use tracing::debug;

/// Failures writing an upload to disk.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The relative path is absolute or contains `..`.
    #[error("refusing to write outside the uploads root: {0}")]
    UnsafePath(String),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<UploadError> for StoreError {
    fn from(err: UploadError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Writes uploads below a root directory.
#[derive(Debug, Clone)]
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a slash-separated relative path below the root.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(relative_path);
        let safe = !relative_path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(UploadError::UnsafePath(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn write(&self, relative_path: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| UploadError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn save(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.write(relative_path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "upload written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path());

        store
            .save("resources/dbms-notes/dbms-notes-1.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("resources/dbms-notes/dbms-notes-1.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn traversal_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path().join("uploads"));

        for path in ["../escape.txt", "/etc/passwd", "images/../../x", ""] {
            let err = store.save(path, b"x").await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(_)), "{path}");
        }
        assert!(!dir.path().join("escape.txt").exists());
    }
}
