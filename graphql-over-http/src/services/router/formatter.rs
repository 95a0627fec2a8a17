//! Serializes execution results into the HTTP response.
//!
//! A request carrying a single operation gets a single object back, a list of operations gets
//! a list of the same length and order. Executed requests always answer `200 OK`, whatever
//! GraphQL errors their operations report.

use bytes::Bytes;
use http::HeaderValue;
use http::StatusCode;
use http::header::ALLOW;
use http::header::CONTENT_TYPE;
use mime::APPLICATION_JSON;
use tower::BoxError;

use super::Body;
use super::Response;
use crate::error::RequestError;
use crate::graphql;

/// Serializes `results` as one object when the request was not a batch, as a list otherwise.
///
/// The output only depends on `results` and `is_batch`.
pub fn format_results(
    results: &[graphql::Response],
    is_batch: bool,
) -> Result<Bytes, serde_json::Error> {
    match (is_batch, results) {
        (false, [single]) => serde_json::to_vec(single),
        _ => serde_json::to_vec(results),
    }
    .map(Bytes::from)
}

/// The `200 OK` response of an executed request.
pub(crate) fn graphql_response(
    results: &[graphql::Response],
    is_batch: bool,
) -> Result<Response, BoxError> {
    Ok(http::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, APPLICATION_JSON.essence_str())
        .body(Body::from(format_results(results, is_batch)?))?)
}

/// The response rejecting a request that could not be turned into operations.
pub(crate) fn error_response(error: &RequestError) -> Result<Response, BoxError> {
    let body = graphql::Response::builder()
        .error(graphql::Error::from(error))
        .build();
    let mut builder = http::Response::builder()
        .status(error.status_code())
        .header(CONTENT_TYPE, APPLICATION_JSON.essence_str());
    if let RequestError::MethodNotAllowed(_) = error {
        builder = builder.header(ALLOW, HeaderValue::from_static("POST"));
    }
    Ok(builder.body(Body::from(serde_json::to_vec(&body)?))?)
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde_json_bytes::json;

    use super::*;
    use crate::services::router::body::into_bytes;

    fn results() -> Vec<graphql::Response> {
        vec![
            graphql::Response::builder()
                .data(json!({ "hero": { "name": "R2-D2" } }))
                .build(),
            graphql::Response::builder()
                .data(serde_json_bytes::Value::Null)
                .error(
                    graphql::Error::builder()
                        .message("Name could not be fetched.")
                        .path("hero.name".parse::<crate::json_ext::Path>().unwrap())
                        .build(),
                )
                .build(),
        ]
    }

    #[test]
    fn single_result_is_not_wrapped() {
        let bytes = format_results(&results()[..1], false).unwrap();
        insta::assert_snapshot!(
            String::from_utf8(bytes.to_vec()).unwrap(),
            @r#"{"data":{"hero":{"name":"R2-D2"}}}"#
        );
    }

    #[test]
    fn batch_results_keep_their_order() {
        let bytes = format_results(&results(), true).unwrap();
        insta::assert_snapshot!(
            String::from_utf8(bytes.to_vec()).unwrap(),
            @r#"[{"data":{"hero":{"name":"R2-D2"}}},{"data":null,"errors":[{"message":"Name could not be fetched.","path":["hero","name"]}]}]"#
        );
    }

    #[test]
    fn batch_of_one_stays_a_list() {
        let bytes = format_results(&results()[..1], true).unwrap();
        assert_eq!(bytes, Bytes::from(r#"[{"data":{"hero":{"name":"R2-D2"}}}]"#));
    }

    #[test]
    fn formatting_is_deterministic() {
        let results = results();
        for is_batch in [true, false] {
            let results = if is_batch { &results[..] } else { &results[1..] };
            assert_eq!(
                format_results(results, is_batch).unwrap(),
                format_results(results, is_batch).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn error_response_shape() {
        let response = error_response(&RequestError::EmptyBatch).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = into_bytes(response.into_body()).await.unwrap();
        insta::assert_snapshot!(
            String::from_utf8(body.to_vec()).unwrap(),
            @r#"{"errors":[{"message":"a batch must contain at least one operation","extensions":{"code":"EMPTY_BATCH"}}]}"#
        );
    }

    #[test]
    fn method_not_allowed_lists_post() {
        let response = error_response(&RequestError::MethodNotAllowed(Method::GET)).unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "POST");
    }
}
