use crate::application::ports::storage_port::StorageError;
use crate::domain::uploads::NameError;

pub mod upload_form_file;
pub mod upload_named_file;

/// A file part as received from the client, fully read.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("No file part")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    /// The filename stays out of the message: it ends up in a cookie.
    #[error("File type not allowed")]
    ExtensionNotAllowed { filename: String },
    #[error("Invalid file name")]
    InvalidFilename(#[source] NameError),
    #[error("File too large (max: {max_bytes} bytes)")]
    TooLarge { max_bytes: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// Errors caused by what the client sent, as opposed to the server failing.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
