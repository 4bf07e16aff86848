use crate::application::ports::storage_port::{StoragePort, StoredFile};
use crate::application::use_cases::uploads::{IncomingFile, UploadError};
use crate::domain::uploads::StoredName;

/// Stores an upload under a name chosen by the server or the URL, ignoring
/// the client filename.
pub struct UploadNamedFile<'a, S>
where
    S: StoragePort + ?Sized,
{
    pub storage: &'a S,
}

impl<'a, S> UploadNamedFile<'a, S>
where
    S: StoragePort + ?Sized,
{
    pub async fn execute(
        &self,
        target: &StoredName,
        incoming: Option<IncomingFile>,
    ) -> Result<StoredFile, UploadError> {
        let file = incoming.ok_or(UploadError::NoFilePart)?;
        let stored = self
            .storage
            .write_replace(target, file.bytes)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, target = %target, "store_upload_failed");
                err
            })?;
        tracing::info!(
            target = %stored.name,
            client_filename = %file.filename,
            path = %stored.relative_path,
            content_type = %stored.content_type,
            size = stored.size,
            sha256 = %stored.content_hash,
            "upload_stored"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::FsStoragePort;
    use tempfile::TempDir;

    #[tokio::test]
    async fn second_upload_replaces_first() {
        let temp = TempDir::new().unwrap();
        let storage = FsStoragePort::new(temp.path()).unwrap();
        let target = StoredName::from_segment("image.jpg").unwrap();
        let uc = UploadNamedFile { storage: &storage };

        for content in [&b"AAA"[..], &b"BBB"[..]] {
            uc.execute(
                &target,
                Some(IncomingFile {
                    filename: "a.jpg".into(),
                    bytes: content.to_vec(),
                }),
            )
            .await
            .unwrap();
        }

        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(std::fs::read(temp.path().join("image.jpg")).unwrap(), b"BBB");
    }

    #[tokio::test]
    async fn client_filename_is_ignored() {
        let temp = TempDir::new().unwrap();
        let storage = FsStoragePort::new(temp.path()).unwrap();
        let target = StoredName::from_segment("person.png").unwrap();
        let uc = UploadNamedFile { storage: &storage };

        let stored = uc
            .execute(
                &target,
                Some(IncomingFile {
                    filename: "../../evil.sh".into(),
                    bytes: b"png".to_vec(),
                }),
            )
            .await
            .unwrap();

        assert_eq!(stored.name, target);
        assert!(!temp.path().join("evil.sh").exists());
        assert_eq!(std::fs::read(temp.path().join("person.png")).unwrap(), b"png");
    }

    #[tokio::test]
    async fn missing_part_is_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = FsStoragePort::new(temp.path()).unwrap();
        let target = StoredName::from_segment("image.jpg").unwrap();
        let uc = UploadNamedFile { storage: &storage };

        let err = uc.execute(&target, None).await.unwrap_err();
        assert!(matches!(err, UploadError::NoFilePart));
        assert!(err.is_client_error());
    }
}
