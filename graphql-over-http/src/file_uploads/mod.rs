//! Files uploaded with the [GraphQL multipart request] convention.
//!
//! A multipart request carries an `operations` field (the JSON body of a regular request, with
//! `null` where files go), a `map` field naming, for each file part, the paths of those `null`s,
//! and the file parts themselves.
//!
//! [GraphQL multipart request]: https://github.com/jaydenseric/graphql-multipart-request-spec

use indexmap::IndexMap;

pub use self::config::FileUploadsConfig;
pub use self::config::MultipartRequestLimits;
pub use self::error::FileUploadError;
use self::map_field::MapField;
pub(crate) use self::multipart_request::MultipartRequest;
pub use self::upload::Upload;
use crate::error::RequestError;
use crate::graphql::InputValue;
use crate::json_ext::Path;

mod config;
mod error;
mod map_field;
mod multipart_request;
mod upload;

/// Parses `operations` and replaces the `null`s listed in `map` with the matching files.
///
/// Entries of `map` are applied in the order they are listed, and so are the paths of each
/// entry. The first failure aborts the whole mapping and nothing of the partially spliced
/// tree is returned. Without a `map`, `operations` is returned as parsed.
///
/// Every path of a file receives its own [`Upload`] handle. Files that `map` does not
/// mention are left out.
pub fn map_operations(
    operations: &str,
    map: Option<&str>,
    files: &IndexMap<String, Upload>,
) -> Result<InputValue, RequestError> {
    let mut tree: InputValue = serde_json::from_str(operations).map_err(|err| {
        RequestError::malformed(format!(
            "invalid JSON in the 'operations' multipart field: {err}"
        ))
    })?;
    if !matches!(tree, InputValue::Object(_) | InputValue::Array(_)) {
        return Err(RequestError::malformed(format!(
            "the 'operations' multipart field must be an object or a list, found {}",
            tree.kind()
        )));
    }

    let map = match map {
        Some(map) => MapField::parse(map)?,
        None => MapField::default(),
    };
    for (file, paths) in map.iter() {
        let upload = files
            .get(file)
            .ok_or_else(|| RequestError::MissingFilePart(file.to_string()))?;
        for path in paths {
            path.parse::<Path>()
                .and_then(|parsed| tree.replace(&parsed, upload.clone().into()))
                .map_err(|source| RequestError::InvalidUploadPath {
                    path: path.clone(),
                    source,
                })?;
        }
    }

    for file in files.keys().filter(|file| !map.references(file)) {
        tracing::debug!(file = %file, "ignoring multipart file part missing from 'map'");
    }
    Ok(tree)
}
