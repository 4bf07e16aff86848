use std::fmt::Write as _;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use sha2::{Digest, Sha256};

use crate::application::ports::storage_port::StorageError;
use crate::domain::uploads::StoredName;

const TEMP_PREFIX: &str = ".upload-";
const TEMP_SUFFIX: &str = ".part";

/// Joins `name` onto `root` and checks the result is a direct child of it.
pub fn resolve_within(root: &Path, name: &StoredName) -> Result<PathBuf, StorageError> {
    let candidate = root.join(name.as_str());
    let rel = candidate
        .strip_prefix(root)
        .map_err(|_| StorageError::OutsideRoot)?;
    let mut components = rel.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name.as_str() => Ok(candidate),
        _ => Err(StorageError::OutsideRoot),
    }
}

pub fn relative_from_uploads(uploads_root: &Path, full: &Path) -> String {
    match full.strip_prefix(uploads_root) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => full.to_string_lossy().to_string(),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

/// Writes into a temp file next to `target` and renames it over `target`.
/// On any failure the temp file is removed and `target` keeps its old content.
pub fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write temp file {}", tmp.path().display()))?;
    tmp.as_file().sync_all().context("sync temp file")?;
    tmp.persist(target)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {}", target.display()))?;
    Ok(())
}
