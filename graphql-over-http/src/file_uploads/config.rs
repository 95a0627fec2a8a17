use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/// Limits applied to the files of a multipart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct MultipartRequestLimits {
    /// The maximum amount of files allowed in a single request (default: 5)
    pub(crate) max_files: usize,
    /// The maximum size of each file, in bytes (default: 5MiB)
    pub(crate) max_file_size: usize,
}

impl Default for MultipartRequestLimits {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_size: 5_242_880, // 5mb
        }
    }
}

#[buildstructor::buildstructor]
impl MultipartRequestLimits {
    #[builder(visibility = "pub")]
    fn new(max_files: Option<usize>, max_file_size: Option<usize>) -> Self {
        let defaults = Self::default();
        Self {
            max_files: max_files.unwrap_or(defaults.max_files),
            max_file_size: max_file_size.unwrap_or(defaults.max_file_size),
        }
    }
}

/// Configuration for File Uploads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct FileUploadsConfig {
    /// Accept `multipart/form-data` requests carrying files (default: true)
    pub(crate) enabled: bool,

    /// Limits on the files of a single request
    pub(crate) limits: MultipartRequestLimits,
}

impl Default for FileUploadsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limits: Default::default(),
        }
    }
}

#[buildstructor::buildstructor]
impl FileUploadsConfig {
    #[builder(visibility = "pub")]
    fn new(enabled: Option<bool>, limits: Option<MultipartRequestLimits>) -> Self {
        Self {
            enabled: enabled.unwrap_or(true),
            limits: limits.unwrap_or_default(),
        }
    }
}
