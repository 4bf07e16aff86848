use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::task;

use crate::application::ports::storage_port::{StorageError, StoragePort, StoredFile};
use crate::application::services::path_locks::PathLocks;
use crate::domain::uploads::StoredName;
use crate::infrastructure::storage::{relative_from_uploads, resolve_within, sha256_hex, write_atomically};

pub struct FsStoragePort {
    uploads_root: PathBuf,
    locks: PathLocks,
}

impl FsStoragePort {
    /// Creates the root if needed. The root is canonicalized once so that
    /// containment checks compare like with like.
    pub fn new(uploads_root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let requested = uploads_root.as_ref();
        std::fs::create_dir_all(requested)
            .with_context(|| format!("create storage root {}", requested.display()))?;
        let uploads_root = requested
            .canonicalize()
            .with_context(|| format!("canonicalize storage root {}", requested.display()))?;
        Ok(Self {
            uploads_root,
            locks: PathLocks::new(),
        })
    }
}

#[async_trait::async_trait]
impl StoragePort for FsStoragePort {
    fn root(&self) -> &Path {
        &self.uploads_root
    }

    fn resolve(&self, name: &StoredName) -> Result<PathBuf, StorageError> {
        resolve_within(&self.uploads_root, name)
    }

    async fn write_replace(
        &self,
        name: &StoredName,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StorageError> {
        let target = self.resolve(name)?;
        let _guard = self.locks.lock(&target).await;

        let size = bytes.len() as u64;
        let dir = self.uploads_root.clone();
        let dest = target.clone();
        let content_hash = task::spawn_blocking(move || {
            write_atomically(&dir, &dest, &bytes)?;
            Ok::<_, anyhow::Error>(sha256_hex(&bytes))
        })
        .await
        .map_err(|err| StorageError::Io(err.into()))?
        .map_err(StorageError::Io)?;

        let content_type = mime_guess::from_path(&target)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(StoredFile {
            name: name.clone(),
            relative_path: relative_from_uploads(&self.uploads_root, &target),
            size,
            content_hash,
            content_type,
        })
    }

    async fn is_available(&self) -> bool {
        tokio::fs::metadata(&self.uploads_root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}
