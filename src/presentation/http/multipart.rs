use axum::extract::Multipart;

use crate::application::use_cases::uploads::{IncomingFile, UploadError};
use crate::presentation::http::error::ApiError;

/// Reads the first file part called `field_name`, aborting as soon as it
/// grows past `max_bytes`. Parts without a filename are form values, not
/// files, and are skipped like every other field.
pub async fn read_file_field(
    multipart: &mut Multipart,
    field_name: &str,
    max_bytes: usize,
) -> Result<Option<IncomingFile>, ApiError> {
    let mut found: Option<IncomingFile> = None;
    while let Some(mut field) = multipart.next_field().await? {
        if found.is_some() || field.name() != Some(field_name) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { max_bytes }.into());
            }
            bytes.extend_from_slice(&chunk);
        }
        found = Some(IncomingFile { filename, bytes });
    }
    Ok(found)
}
