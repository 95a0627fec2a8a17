//! Errors that reject a whole HTTP request before any operation runs.
use displaydoc::Display;
use http::Method;
use http::StatusCode;
use thiserror::Error;

pub use crate::configuration::ConfigurationError;
use crate::file_uploads::FileUploadError;
pub use crate::graphql::Error;
use crate::json_ext::PathError;

/// A request that does not follow the GraphQL over HTTP protocol.
///
/// Returned before any operation of the request is executed. Each variant maps to an HTTP
/// status and to the `code` extension of the single error in the response body.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum RequestError {
    /// malformed request payload: {reason}
    MalformedPayload { reason: String },

    /// a batch must contain at least one operation
    EmptyBatch,

    /// invalid operation at index {index}: {reason}
    InvalidOperation { index: usize, reason: String },

    /// file part '{0}' referenced in 'map' is missing from the request
    MissingFilePart(String),

    /// invalid path '{path}' in 'map': {source}
    InvalidUploadPath { path: String, source: PathError },

    /// batching is not enabled
    BatchingNotEnabled,

    /// batch of {size} operations exceeds the configured maximum of {maximum}
    BatchLimitExceeded { size: usize, maximum: usize },

    /// {0}
    FileUpload(#[from] FileUploadError),

    /// request body exceeds the limit of {limit} bytes
    PayloadTooLarge { limit: usize },

    /// unsupported content type: {0}
    UnsupportedMediaType(String),

    /// method {0} is not allowed, use POST
    MethodNotAllowed(Method),

    /// could not read the request body: {reason}
    BodyRead { reason: String },
}

impl RequestError {
    /// The HTTP status of the response rejecting the request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RequestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::BatchLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The stable `code` extension of the error.
    pub fn code(&self) -> &'static str {
        match self {
            RequestError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            RequestError::EmptyBatch => "EMPTY_BATCH",
            RequestError::InvalidOperation { .. } => "INVALID_OPERATION",
            RequestError::MissingFilePart(_) => "MISSING_FILE_PART",
            RequestError::InvalidUploadPath { .. } => "INVALID_UPLOAD_PATH",
            RequestError::BatchingNotEnabled => "BATCHING_NOT_ENABLED",
            RequestError::BatchLimitExceeded { .. } => "BATCH_LIMIT_EXCEEDED",
            RequestError::FileUpload(error) => error.code(),
            RequestError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            RequestError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            RequestError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            RequestError::BodyRead { .. } => "BODY_READ_ERROR",
        }
    }

    pub(crate) fn malformed(reason: impl ToString) -> Self {
        RequestError::MalformedPayload {
            reason: reason.to_string(),
        }
    }
}

impl From<&RequestError> for Error {
    fn from(error: &RequestError) -> Self {
        Error::builder()
            .message(error.to_string())
            .extension_code(error.code())
            .build()
    }
}

impl From<RequestError> for Error {
    fn from(error: RequestError) -> Self {
        Error::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            RequestError::EmptyBatch.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::MissingFilePart("0".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::MethodNotAllowed(Method::GET).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            RequestError::BatchLimitExceeded {
                size: 3,
                maximum: 2
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            RequestError::from(FileUploadError::MaxFilesLimitExceeded(5)).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn graphql_error() {
        let error = Error::from(RequestError::InvalidUploadPath {
            path: "variables.file".to_string(),
            source: PathError::NotNull {
                at: "variables.file".to_string(),
                found: "string",
            },
        });
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({
                "message": "invalid path 'variables.file' in 'map': value at 'variables.file' must be null, found string",
                "extensions": { "code": "INVALID_UPLOAD_PATH" }
            })
        );
    }

    #[test]
    fn invalid_operation_names_the_index() {
        let error = RequestError::InvalidOperation {
            index: 2,
            reason: "missing 'query'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "invalid operation at index 2: missing 'query'"
        );
    }
}
