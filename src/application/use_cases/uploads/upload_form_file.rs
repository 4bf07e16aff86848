use crate::application::ports::storage_port::{StoragePort, StoredFile};
use crate::application::use_cases::uploads::{IncomingFile, UploadError};
use crate::domain::uploads::{AllowedExtensions, StoredName};

/// Stores a browser form upload under its sanitized client filename.
pub struct UploadFormFile<'a, S>
where
    S: StoragePort + ?Sized,
{
    pub storage: &'a S,
    pub allowed: &'a AllowedExtensions,
}

impl<'a, S> UploadFormFile<'a, S>
where
    S: StoragePort + ?Sized,
{
    pub async fn execute(&self, incoming: Option<IncomingFile>) -> Result<StoredFile, UploadError> {
        let file = incoming.ok_or(UploadError::NoFilePart)?;
        if file.filename.is_empty() {
            return Err(UploadError::NoSelectedFile);
        }
        if !self.allowed.permits(&file.filename) {
            return Err(UploadError::ExtensionNotAllowed {
                filename: file.filename,
            });
        }
        let name = StoredName::sanitize(&file.filename).map_err(UploadError::InvalidFilename)?;
        // ".png" sanitizes to "png"; the stored name must still carry an allowed extension.
        if !self.allowed.permits(name.as_str()) {
            return Err(UploadError::ExtensionNotAllowed {
                filename: file.filename,
            });
        }

        let stored = self
            .storage
            .write_replace(&name, file.bytes)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, filename = %name, "store_upload_failed");
                err
            })?;
        tracing::info!(
            filename = %stored.name,
            path = %stored.relative_path,
            content_type = %stored.content_type,
            size = stored.size,
            sha256 = %stored.content_hash,
            "upload_stored"
        );
        Ok(stored)
    }
}
