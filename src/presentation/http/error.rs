use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::ports::storage_port::StorageError;
use crate::application::use_cases::uploads::UploadError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Malformed multipart body")]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Upload(err) => match err {
                UploadError::NoFilePart | UploadError::NoSelectedFile => {
                    (StatusCode::BAD_REQUEST, "NO_FILE", err.to_string())
                }
                UploadError::ExtensionNotAllowed { .. } => (
                    StatusCode::BAD_REQUEST,
                    "EXTENSION_NOT_ALLOWED",
                    err.to_string(),
                ),
                UploadError::InvalidFilename(reason) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_FILENAME",
                    format!("Invalid file name: {reason}"),
                ),
                UploadError::TooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE", err.to_string())
                }
                UploadError::Storage(StorageError::OutsideRoot) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_FILENAME",
                    "Invalid file name".to_string(),
                ),
                UploadError::Storage(StorageError::Io(_)) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Storage operation failed".to_string(),
                ),
            },
            // The body limit surfaces here as 413.
            Self::Multipart(err) => (err.status(), "INVALID_MULTIPART", err.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request_failed");
        } else {
            tracing::warn!(%status, code = error, %message, "upload_rejected");
        }
        (status, Json(ErrorBody { error, message })).into_response()
    }
}
