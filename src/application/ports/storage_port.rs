use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::uploads::StoredName;

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: StoredName,
    pub relative_path: String,
    pub size: u64,
    pub content_hash: String,
    pub content_type: String,
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("resolved path escapes the storage root")]
    OutsideRoot,
    #[error("storage I/O failed")]
    Io(#[source] anyhow::Error),
}

#[async_trait]
pub trait StoragePort: Send + Sync {
    fn root(&self) -> &Path;
    /// Absolute target path for `name`; always a direct child of the root.
    fn resolve(&self, name: &StoredName) -> Result<PathBuf, StorageError>;
    /// Creates or atomically replaces the file called `name`.
    async fn write_replace(
        &self,
        name: &StoredName,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StorageError>;
    async fn is_available(&self) -> bool;
}
