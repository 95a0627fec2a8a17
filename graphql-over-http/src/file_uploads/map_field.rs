use indexmap::IndexMap;

use crate::error::RequestError;

pub(super) type MapFieldRaw = IndexMap<String, Vec<String>>;

/// The `map` field of a multipart request: for each file part, the places in `operations`
/// where it goes.
#[derive(Debug, Default)]
pub(super) struct MapField {
    per_file: MapFieldRaw,
}

impl MapField {
    pub(super) fn parse(map: &str) -> Result<Self, RequestError> {
        serde_json::from_str::<MapFieldRaw>(map)
            .map(|per_file| Self { per_file })
            .map_err(|err| {
                RequestError::malformed(format!("invalid JSON in the 'map' multipart field: {err}"))
            })
    }

    /// Entries in the order the client listed them.
    pub(super) fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.per_file
            .iter()
            .map(|(file, paths)| (file.as_str(), paths.as_slice()))
    }

    pub(super) fn references(&self, file: &str) -> bool {
        self.per_file.contains_key(file)
    }
}
