use bytes::BytesMut;
use indexmap::IndexMap;
use multer::Constraints;
use multer::Multipart;
use multer::SizeLimit;

use super::FileUploadError;
use super::MultipartRequestLimits;
use super::Upload;
use crate::error::RequestError;
use crate::graphql::InputValue;
use crate::services::router::Body;

const OPERATIONS_FIELD: &str = "operations";
const MAP_FIELD: &str = "map";

/// The fields of a `multipart/form-data` request, read to completion.
#[derive(Debug)]
pub(crate) struct MultipartRequest {
    pub(crate) operations: String,
    pub(crate) map: Option<String>,
    pub(crate) files: IndexMap<String, Upload>,
}

impl MultipartRequest {
    /// Reads every part of `body`.
    ///
    /// `operations` and `map` are limited to `max_field_size` bytes each, files to the
    /// configured upload limits.
    pub(crate) async fn read(
        body: Body,
        boundary: String,
        limits: MultipartRequestLimits,
        max_field_size: usize,
    ) -> Result<Self, RequestError> {
        let constraints = Constraints::new().size_limit(
            SizeLimit::new()
                .for_field(OPERATIONS_FIELD, max_field_size as u64)
                .for_field(MAP_FIELD, max_field_size as u64),
        );
        let mut multipart =
            Multipart::with_constraints(body.into_data_stream(), boundary, constraints);
        let read_error = |error: multer::Error| match error {
            multer::Error::FieldSizeExceeded { .. } => RequestError::PayloadTooLarge {
                limit: max_field_size,
            },
            error => FileUploadError::from(error).into(),
        };

        let mut operations = None;
        let mut map = None;
        let mut files = IndexMap::new();
        while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                OPERATIONS_FIELD => operations = Some(field.text().await.map_err(read_error)?),
                MAP_FIELD => map = Some(field.text().await.map_err(read_error)?),
                _ => {
                    if !files.contains_key(&name) && files.len() >= limits.max_files {
                        return Err(FileUploadError::MaxFilesLimitExceeded(limits.max_files).into());
                    }
                    let filename = field.file_name().map(str::to_string);
                    let content_type = field.content_type().cloned();
                    let mut content = BytesMut::new();
                    while let Some(chunk) = field.chunk().await.map_err(read_error)? {
                        if content.len() + chunk.len() > limits.max_file_size {
                            return Err(FileUploadError::MaxFileSizeLimitExceeded {
                                limit: limits.max_file_size,
                                filename: filename.unwrap_or(name),
                            }
                            .into());
                        }
                        content.extend_from_slice(&chunk);
                    }
                    tracing::trace!(file = %name, size = content.len(), "received file part");
                    let upload = Upload::builder()
                        .name(name.clone())
                        .and_filename(filename)
                        .and_content_type(content_type)
                        .content(content.freeze())
                        .build();
                    files.insert(name, upload);
                }
            }
        }

        let operations = operations.ok_or_else(|| {
            RequestError::malformed("missing multipart field 'operations'")
        })?;
        Ok(Self {
            operations,
            map,
            files,
        })
    }

    /// Splices the files into `operations`.
    pub(crate) fn into_operations(self) -> Result<InputValue, RequestError> {
        super::map_operations(&self.operations, self.map.as_deref(), &self.files)
    }
}
