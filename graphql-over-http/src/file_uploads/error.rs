use thiserror::Error;

/// Errors that may occur while reading the parts of a multipart request
#[derive(Debug, Error)]
pub enum FileUploadError {
    /// Represents an invalid request, wrapping the context as a string
    #[error("invalid multipart request: {0}")]
    InvalidMultipartRequest(#[from] multer::Error),

    #[error("Exceeded the limit of {0} file uploads of files in a single request.")]
    MaxFilesLimitExceeded(usize),

    #[error("Exceeded the limit of {limit} bytes on {filename} file.")]
    MaxFileSizeLimitExceeded { limit: usize, filename: String },
}

impl FileUploadError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            FileUploadError::InvalidMultipartRequest(_) => "INVALID_MULTIPART_REQUEST",
            FileUploadError::MaxFilesLimitExceeded(_) => "FILE_UPLOADS_LIMITS_MAX_FILES_EXCEEDED",
            FileUploadError::MaxFileSizeLimitExceeded { .. } => {
                "FILE_UPLOADS_LIMITS_MAX_FILE_SIZE_EXCEEDED"
            }
        }
    }
}
