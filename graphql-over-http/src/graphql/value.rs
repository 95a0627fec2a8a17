use indexmap::IndexMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Number;

use crate::file_uploads::Upload;
use crate::json_ext::Path;
use crate::json_ext::PathElement;
use crate::json_ext::PathError;

/// Variables of a GraphQL operation, in the order the client sent them.
pub type Variables = IndexMap<String, InputValue>;

/// A JSON value received from a client, which may have uploaded files spliced into it.
///
/// Uploads only ever replace `null` placeholders, so an [`InputValue`] without uploads is
/// exactly the JSON it was parsed from. When serialized, an upload is written as `null`
/// again.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum InputValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<InputValue>),
    Object(Variables),
    Upload(Upload),
}

impl InputValue {
    /// A short name for the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            InputValue::Null => "null",
            InputValue::Bool(_) => "boolean",
            InputValue::Number(_) => "number",
            InputValue::String(_) => "string",
            InputValue::Array(_) => "list",
            InputValue::Object(_) => "object",
            InputValue::Upload(_) => "upload",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, InputValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            InputValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Variables> {
        match self {
            InputValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[InputValue]> {
        match self {
            InputValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_upload(&self) -> Option<&Upload> {
        match self {
            InputValue::Upload(upload) => Some(upload),
            _ => None,
        }
    }

    /// Whether an upload was spliced anywhere in this value.
    pub fn contains_upload(&self) -> bool {
        match self {
            InputValue::Upload(_) => true,
            InputValue::Array(items) => items.iter().any(InputValue::contains_upload),
            InputValue::Object(map) => map.values().any(InputValue::contains_upload),
            _ => false,
        }
    }

    /// Returns the value found at `path`.
    pub fn resolve(&self, path: &Path) -> Result<&InputValue, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        path.iter()
            .enumerate()
            .try_fold(self, |current, (depth, element)| {
                current.child(element, path, depth)
            })
    }

    /// Replaces the `null` found at `path` with `value`.
    ///
    /// Nothing is written unless the whole path exists and ends on a `null`.
    pub fn replace(&mut self, path: &Path, value: InputValue) -> Result<(), PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let target = path
            .iter()
            .enumerate()
            .try_fold(self, |current, (depth, element)| {
                current.child_mut(element, path, depth)
            })?;
        if !target.is_null() {
            return Err(PathError::NotNull {
                at: path.to_string(),
                found: target.kind(),
            });
        }
        *target = value;
        Ok(())
    }

    fn child(
        &self,
        element: &PathElement,
        path: &Path,
        depth: usize,
    ) -> Result<&InputValue, PathError> {
        let child = match (element, self) {
            (PathElement::Index(index), InputValue::Array(items)) => items.get(*index),
            (PathElement::Key(key), InputValue::Object(map)) => map.get(key),
            (element, current) => return Err(mismatch(element, current, path, depth)),
        };
        child.ok_or_else(|| PathError::NotFound {
            at: path.prefix(depth + 1),
        })
    }

    fn child_mut(
        &mut self,
        element: &PathElement,
        path: &Path,
        depth: usize,
    ) -> Result<&mut InputValue, PathError> {
        let child = match (element, self) {
            (PathElement::Index(index), InputValue::Array(items)) => items.get_mut(*index),
            (PathElement::Key(key), InputValue::Object(map)) => map.get_mut(key),
            (element, current) => return Err(mismatch(element, current, path, depth)),
        };
        child.ok_or_else(|| PathError::NotFound {
            at: path.prefix(depth + 1),
        })
    }
}

fn mismatch(element: &PathElement, current: &InputValue, path: &Path, depth: usize) -> PathError {
    PathError::TypeMismatch {
        at: path.prefix(depth + 1),
        expected: element.container_kind(),
        found: current.kind(),
    }
}

impl From<serde_json_bytes::Value> for InputValue {
    fn from(value: serde_json_bytes::Value) -> Self {
        use serde_json_bytes::Value;
        match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Bool(b),
            Value::Number(n) => InputValue::Number(n),
            Value::String(s) => InputValue::String(s.as_str().to_string()),
            Value::Array(items) => InputValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => InputValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key.as_str().to_string(), value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for InputValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Bool(b),
            Value::Number(n) => InputValue::Number(n),
            Value::String(s) => InputValue::String(s),
            Value::Array(items) => InputValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => InputValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<InputValue> for serde_json_bytes::Value {
    fn from(value: InputValue) -> Self {
        use serde_json_bytes::Value;
        match value {
            InputValue::Null | InputValue::Upload(_) => Value::Null,
            InputValue::Bool(b) => Value::Bool(b),
            InputValue::Number(n) => Value::Number(n),
            InputValue::String(s) => Value::String(s.into()),
            InputValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            InputValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<Upload> for InputValue {
    fn from(upload: Upload) -> Self {
        InputValue::Upload(upload)
    }
}

impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json_bytes::Value::deserialize(deserializer).map(Into::into)
    }
}

impl Serialize for InputValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            InputValue::Null | InputValue::Upload(_) => serializer.serialize_unit(),
            InputValue::Bool(b) => serializer.serialize_bool(*b),
            InputValue::Number(n) => n.serialize(serializer),
            InputValue::String(s) => serializer.serialize_str(s),
            InputValue::Array(items) => serializer.collect_seq(items),
            InputValue::Object(map) => serializer.collect_map(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use super::*;

    fn tree() -> InputValue {
        json!({
            "query": "mutation ($files: [Upload!]!) { upload(files: $files) }",
            "variables": {
                "file": null,
                "files": [null, null],
                "nested": { "deep": [ { "leaf": null } ] },
                "taken": "notnull",
            }
        })
        .into()
    }

    fn upload(content: &'static str) -> Upload {
        Upload::builder()
            .name("0")
            .filename("a.txt")
            .content(Bytes::from_static(content.as_bytes()))
            .build()
    }

    #[test]
    fn deserialize_keeps_key_order() {
        let value: InputValue =
            serde_json::from_str(r#"{"z": 1, "a": [true, null, "s"], "m": {}}"#).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(
            value.resolve(&"a.2".parse().unwrap()).unwrap(),
            &InputValue::String("s".to_string())
        );
    }

    #[test]
    fn serialize_uploads_as_null() {
        let mut value = tree();
        value
            .replace(&"variables.file".parse().unwrap(), upload("hi").into())
            .unwrap();
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            serde_json::to_value(tree()).unwrap()
        );
    }

    #[test]
    fn replace_then_resolve() {
        let mut value = tree();
        for path in ["variables.file", "variables.files.1", "variables.nested.deep.0.leaf"] {
            let path: Path = path.parse().unwrap();
            let replacement = InputValue::String(path.to_string());
            value.replace(&path, replacement.clone()).unwrap();
            assert_eq!(value.resolve(&path).unwrap(), &replacement);
        }
        // untouched placeholders stay null
        assert!(
            value
                .resolve(&"variables.files.0".parse().unwrap())
                .unwrap()
                .is_null()
        );
    }

    #[test]
    fn replace_upload() {
        let mut value = tree();
        let path: Path = "variables.files.0".parse().unwrap();
        value.replace(&path, upload("hi").into()).unwrap();
        let found = value.resolve(&path).unwrap().as_upload().unwrap();
        assert_eq!(found.bytes().as_ref(), b"hi");
    }

    #[test]
    fn replace_requires_null() {
        let mut value = tree();
        let before = value.clone();
        let error = value
            .replace(&"variables.taken".parse().unwrap(), InputValue::Bool(true))
            .unwrap_err();
        assert_eq!(
            error,
            PathError::NotNull {
                at: "variables.taken".to_string(),
                found: "string",
            }
        );
        assert_eq!(value, before);
    }

    #[test]
    fn replace_missing_location() {
        let mut value = tree();
        assert_eq!(
            value.replace(&"variables.nope".parse().unwrap(), InputValue::Null),
            Err(PathError::NotFound {
                at: "variables.nope".to_string()
            })
        );
        assert_eq!(
            value.replace(&"variables.files.2".parse().unwrap(), InputValue::Null),
            Err(PathError::NotFound {
                at: "variables.files.2".to_string()
            })
        );
        assert_eq!(
            value.replace(&"variables.missing.file".parse().unwrap(), InputValue::Null),
            Err(PathError::NotFound {
                at: "variables.missing".to_string()
            })
        );
    }

    #[test]
    fn segment_kind_must_match_container() {
        let mut value = tree();
        assert_eq!(
            value.replace(&"variables.0".parse().unwrap(), InputValue::Null),
            Err(PathError::TypeMismatch {
                at: "variables.0".to_string(),
                expected: "list",
                found: "object",
            })
        );
        assert_eq!(
            value.replace(&"variables.files.first".parse().unwrap(), InputValue::Null),
            Err(PathError::TypeMismatch {
                at: "variables.files.first".to_string(),
                expected: "object",
                found: "list",
            })
        );
        assert_eq!(
            value.resolve(&"variables.taken.inner".parse().unwrap()),
            Err(PathError::TypeMismatch {
                at: "variables.taken.inner".to_string(),
                expected: "object",
                found: "string",
            })
        );
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut value = tree();
        assert_eq!(value.resolve(&Path::default()), Err(PathError::Empty));
        assert_eq!(
            value.replace(&Path::default(), InputValue::Null),
            Err(PathError::Empty)
        );
    }
}
