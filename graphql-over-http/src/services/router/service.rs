//! Implements the HTTP phase of the request lifecycle.

use std::sync::Arc;
use std::task::Poll;

use futures::future::BoxFuture;
use http::Method;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use mediatype::MediaType;
use mediatype::ReadParams;
use mediatype::names::APPLICATION;
use mediatype::names::BOUNDARY;
use mediatype::names::FORM_DATA;
use mediatype::names::JSON;
use mediatype::names::MULTIPART;
use tower::BoxError;
use tower::Service;
use tracing::Instrument;

use super::Body;
use super::body::read_limited;
use super::formatter;
use crate::Configuration;
use crate::batching::Batch;
use crate::error::RequestError;
use crate::file_uploads::FileUploadError;
use crate::file_uploads::MultipartRequest;
use crate::graphql::InputValue;
use crate::services::ExecutionDispatcher;
use crate::services::router;

/// Turns an HTTP request into operations, runs them and answers with their results.
#[derive(Clone)]
pub(crate) struct RouterService {
    dispatcher: ExecutionDispatcher,
    configuration: Arc<Configuration>,
}

impl RouterService {
    pub(crate) fn new(dispatcher: ExecutionDispatcher, configuration: Arc<Configuration>) -> Self {
        RouterService {
            dispatcher,
            configuration,
        }
    }
}

impl Service<router::Request> for RouterService {
    type Response = router::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: router::Request) -> Self::Future {
        let self_clone = self.clone();

        let this = std::mem::replace(self, self_clone);

        let fut = async move { this.call_inner(req).await };

        Box::pin(fut)
    }
}

impl RouterService {
    async fn call_inner(self, req: router::Request) -> Result<router::Response, BoxError> {
        let span = tracing::info_span!(
            "graphql_request",
            http.method = %req.method(),
            http.content_type = tracing::field::Empty,
            graphql.batch.size = tracing::field::Empty,
        );
        let (parts, body) = req.into_parts();
        if let Some(content_type) = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            span.record("http.content_type", content_type);
        }

        async move {
            let batch = match translate_request(&self.configuration, &parts, body).await {
                Ok(batch) => batch,
                Err(error) => {
                    tracing::debug!(code = error.code(), %error, "rejecting request");
                    return formatter::error_response(&error);
                }
            };
            tracing::Span::current().record("graphql.batch.size", batch.len());

            let is_batch = batch.is_batch();
            let execution = self.dispatcher.execute(&parts, batch);
            let results = execution.await;
            formatter::graphql_response(&results, is_batch)
        }
        .instrument(span)
        .await
    }
}

/// Reads the operations of a request, spliced with its uploaded files.
///
/// Nothing is executed yet, so any error here rejects the request as a whole.
pub(crate) async fn translate_request(
    configuration: &Configuration,
    parts: &Parts,
    body: Body,
) -> Result<Batch, RequestError> {
    if parts.method != Method::POST {
        return Err(RequestError::MethodNotAllowed(parts.method.clone()));
    }
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| RequestError::UnsupportedMediaType("missing content type".to_string()))?;
    let media_type = MediaType::parse(content_type)
        .map_err(|_| RequestError::UnsupportedMediaType(content_type.to_string()))?;

    let operations = if media_type.ty == APPLICATION
        && (media_type.subty == JSON || media_type.suffix == Some(JSON))
    {
        let bytes = read_limited(body, configuration.limits.http_max_request_bytes)
            .instrument(tracing::debug_span!("receive_body"))
            .await?;
        serde_json::from_slice::<InputValue>(&bytes).map_err(|err| {
            RequestError::malformed(format!(
                "failed to deserialize the request body into JSON: {err}"
            ))
        })?
    } else if media_type.ty == MULTIPART && media_type.subty == FORM_DATA {
        if !configuration.file_uploads.enabled {
            return Err(RequestError::UnsupportedMediaType(content_type.to_string()));
        }
        let boundary = media_type
            .get_param(BOUNDARY)
            .ok_or_else(|| FileUploadError::InvalidMultipartRequest(multer::Error::NoBoundary))?
            .to_string();
        MultipartRequest::read(
            body,
            boundary,
            configuration.file_uploads.limits,
            configuration.limits.http_max_request_bytes,
        )
        .instrument(tracing::debug_span!("multipart"))
        .await?
        .into_operations()?
    } else {
        return Err(RequestError::UnsupportedMediaType(content_type.to_string()));
    };

    let batch = Batch::from_operations(operations)?;
    configuration.batching.check(&batch)?;
    Ok(batch)
}
