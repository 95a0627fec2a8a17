//! Normalizes a request body into the ordered list of operations it carries.
//!
//! A body is either one operation object or a list of them. Both become a [`Batch`], which
//! remembers which shape the client used so the response can mirror it.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;

use crate::error::RequestError;
use crate::graphql;
use crate::graphql::InputValue;
use crate::json_ext::Object;

/// How the operations of a batch are driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchingMode {
    /// All operations run concurrently
    #[default]
    Parallel,

    /// Each operation starts once the previous one completed
    Sequential,
}

/// Configuration for Batching
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Batching {
    /// Accept lists of operations (default: true)
    pub(crate) enabled: bool,

    /// How the operations of a batch are executed (default: parallel)
    pub(crate) mode: BatchingMode,

    /// Maximum size for a batch
    pub(crate) maximum_size: Option<usize>,
}

impl Default for Batching {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: Default::default(),
            maximum_size: None,
        }
    }
}

#[buildstructor::buildstructor]
impl Batching {
    #[builder(visibility = "pub")]
    fn new(enabled: Option<bool>, mode: Option<BatchingMode>, maximum_size: Option<usize>) -> Self {
        Self {
            enabled: enabled.unwrap_or(true),
            mode: mode.unwrap_or_default(),
            maximum_size,
        }
    }
}

impl Batching {
    pub(crate) fn exceeds_batch_size(&self, batch: &Batch) -> bool {
        match self.maximum_size {
            Some(maximum_size) => batch.len() > maximum_size,
            None => false,
        }
    }

    /// Rejects batches this configuration does not accept.
    pub(crate) fn check(&self, batch: &Batch) -> Result<(), RequestError> {
        if !batch.is_batch() {
            return Ok(());
        }
        if !self.enabled {
            return Err(RequestError::BatchingNotEnabled);
        }
        if self.exceeds_batch_size(batch) {
            return Err(RequestError::BatchLimitExceeded {
                size: batch.len(),
                maximum: self.maximum_size.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// The operations of one HTTP request, in the order the client sent them.
///
/// Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    requests: Vec<graphql::Request>,
    is_batch: bool,
}

impl Batch {
    /// A batch holding a single operation sent on its own.
    pub fn single(request: graphql::Request) -> Self {
        Self {
            requests: vec![request],
            is_batch: false,
        }
    }

    /// Builds a batch from a parsed request body.
    ///
    /// An object is one operation, a non-empty list of objects is a batch. The first invalid
    /// operation rejects the whole body.
    pub fn from_operations(operations: InputValue) -> Result<Self, RequestError> {
        match operations {
            InputValue::Object(_) => Ok(Self::single(operation(0, operations)?)),
            InputValue::Array(items) if items.is_empty() => Err(RequestError::EmptyBatch),
            InputValue::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| operation(index, item))
                .collect::<Result<Vec<_>, _>>()
                .map(|requests| Self {
                    requests,
                    is_batch: true,
                }),
            other => Err(RequestError::malformed(format!(
                "expected an operation or a list of operations, found {}",
                other.kind()
            ))),
        }
    }

    /// Whether the client sent a list, even one of a single operation.
    pub fn is_batch(&self) -> bool {
        self.is_batch
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[graphql::Request] {
        &self.requests
    }

    pub fn into_requests(self) -> Vec<graphql::Request> {
        self.requests
    }
}

fn operation(index: usize, value: InputValue) -> Result<graphql::Request, RequestError> {
    let mut object = match value {
        InputValue::Object(object) => object,
        other => {
            return Err(RequestError::malformed(format!(
                "operation at index {index} must be an object, found {}",
                other.kind()
            )));
        }
    };
    let invalid = |reason: String| RequestError::InvalidOperation { index, reason };

    let query = match object.shift_remove("query") {
        Some(InputValue::String(query)) if !query.is_empty() => query,
        Some(InputValue::String(_)) => return Err(invalid("'query' must not be empty".to_string())),
        None | Some(InputValue::Null) => return Err(invalid("missing 'query'".to_string())),
        Some(other) => {
            return Err(invalid(format!(
                "'query' must be a string, found {}",
                other.kind()
            )));
        }
    };
    let operation_name = match object.shift_remove("operationName") {
        None | Some(InputValue::Null) => None,
        Some(InputValue::String(name)) => Some(name),
        Some(other) => {
            return Err(invalid(format!(
                "'operationName' must be a string, found {}",
                other.kind()
            )));
        }
    };
    let variables = match object.shift_remove("variables") {
        None | Some(InputValue::Null) => None,
        Some(InputValue::Object(variables)) => Some(variables),
        Some(other) => {
            return Err(invalid(format!(
                "'variables' must be an object, found {}",
                other.kind()
            )));
        }
    };
    let extensions: Object = match object.shift_remove("extensions") {
        None | Some(InputValue::Null) => Object::new(),
        Some(extensions @ InputValue::Object(_)) if extensions.contains_upload() => {
            return Err(invalid("'extensions' cannot hold uploaded files".to_string()));
        }
        Some(InputValue::Object(extensions)) => extensions
            .into_iter()
            .map(|(key, value)| (ByteString::from(key), value.into()))
            .collect(),
        Some(other) => {
            return Err(invalid(format!(
                "'extensions' must be an object, found {}",
                other.kind()
            )));
        }
    };

    Ok(graphql::Request::builder()
        .query(query)
        .and_operation_name(operation_name)
        .and_variables(variables)
        .extensions(extensions)
        .build())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn batch(value: serde_json::Value) -> Result<Batch, RequestError> {
        Batch::from_operations(value.into())
    }

    #[test]
    fn single_operation_is_not_a_batch() {
        let batch = batch(json!({
            "query": "query Hero($id: ID) { hero(id: $id) { name } }",
            "operationName": "Hero",
            "variables": { "id": "1000" },
            "extensions": { "persistedQuery": { "version": 1 } }
        }))
        .unwrap();
        assert!(!batch.is_batch());
        assert_eq!(batch.len(), 1);
        let request = &batch.requests()[0];
        assert_eq!(request.operation_name.as_deref(), Some("Hero"));
        assert_eq!(
            request.variables.get("id"),
            Some(&InputValue::String("1000".to_string()))
        );
        assert_eq!(
            request.extensions.get("persistedQuery"),
            Some(&serde_json_bytes::json!({ "version": 1 }))
        );
    }

    #[test]
    fn list_keeps_order() {
        let batch = batch(json!([
            { "query": "{ a }" },
            { "query": "{ b }", "variables": null, "operationName": null },
            { "query": "{ c }" },
        ]))
        .unwrap();
        assert!(batch.is_batch());
        let queries: Vec<_> = batch
            .into_requests()
            .into_iter()
            .map(|request| request.query)
            .collect();
        assert_eq!(queries, vec!["{ a }", "{ b }", "{ c }"]);
    }

    #[test]
    fn list_of_one_is_still_a_batch() {
        assert!(batch(json!([{ "query": "{ a }" }])).unwrap().is_batch());
    }

    #[test]
    fn empty_list() {
        assert!(matches!(batch(json!([])), Err(RequestError::EmptyBatch)));
    }

    #[test]
    fn invalid_operation_reports_its_index() {
        let cases = [
            (json!([{ "query": "{ a }" }, { "variables": {} }]), 1),
            (json!([{ "query": "" }]), 0),
            (json!([{ "query": "{ a }" }, { "query": "{ b }" }, { "query": 3 }]), 2),
            (json!([{ "query": "{ a }", "variables": [] }]), 0),
            (json!([{ "query": "{ a }", "operationName": true }]), 0),
            (json!({ "query": "{ a }", "extensions": "x" }), 0),
        ];
        for (body, expected) in cases {
            match batch(body.clone()) {
                Err(RequestError::InvalidOperation { index, .. }) => {
                    assert_eq!(index, expected, "{body}")
                }
                other => panic!("{body}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn uploads_are_rejected_in_extensions() {
        let mut operations: InputValue =
            json!([{ "query": "{ a }" }, { "query": "{ b }", "extensions": { "file": null } }])
                .into();
        let path = "1.extensions.file".parse().unwrap();
        operations
            .replace(
                &path,
                crate::file_uploads::Upload::builder()
                    .name("0")
                    .filename("a.txt")
                    .content(bytes::Bytes::from_static(b"a"))
                    .build()
                    .into(),
            )
            .unwrap();
        match Batch::from_operations(operations) {
            Err(RequestError::InvalidOperation { index, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(reason, "'extensions' cannot hold uploaded files");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_shapes_are_malformed() {
        for body in [json!("{ a }"), json!(null), json!([{ "query": "{ a }" }, 1])] {
            assert!(
                matches!(batch(body.clone()), Err(RequestError::MalformedPayload { .. })),
                "{body}"
            );
        }
    }

    #[test]
    fn batching_configuration() {
        let single = batch(json!({ "query": "{ a }" })).unwrap();
        let pair = batch(json!([{ "query": "{ a }" }, { "query": "{ b }" }])).unwrap();

        let disabled = Batching {
            enabled: false,
            ..Default::default()
        };
        assert!(disabled.check(&single).is_ok());
        assert!(matches!(
            disabled.check(&pair),
            Err(RequestError::BatchingNotEnabled)
        ));

        let limited = Batching {
            maximum_size: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            limited.check(&pair),
            Err(RequestError::BatchLimitExceeded {
                size: 2,
                maximum: 1
            })
        ));
        assert!(Batching::default().check(&pair).is_ok());
    }
}
