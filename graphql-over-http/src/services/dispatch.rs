//! Runs the operations of a batch against the engine.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::future::join_all;
use http::request::Parts;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;
use tower::ServiceExt;
use tracing::Instrument;

use super::execution;
use crate::ContextFactory;
use crate::batching::Batch;
use crate::batching::BatchingMode;
use crate::graphql;

pub(crate) const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";
pub(crate) const INTERNAL_SERVER_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

/// Executes each operation of a [`Batch`] with its own [`Context`](crate::Context).
///
/// Results come back in the order of the operations, whichever finishes first. An operation
/// whose engine call fails or panics yields a response holding a single masked error, and
/// the other operations of the batch are not affected.
#[derive(Clone)]
pub struct ExecutionDispatcher {
    engine: execution::BoxCloneService,
    context_factory: Arc<dyn ContextFactory>,
    mode: BatchingMode,
    expose_internal_errors: bool,
}

impl ExecutionDispatcher {
    pub fn new(
        engine: execution::BoxCloneService,
        context_factory: Arc<dyn ContextFactory>,
        mode: BatchingMode,
        expose_internal_errors: bool,
    ) -> Self {
        Self {
            engine,
            context_factory,
            mode,
            expose_internal_errors,
        }
    }

    /// Executes every operation of `batch`.
    ///
    /// Contexts are created right away, one per operation, from the parts of the HTTP request.
    /// The returned future does not borrow the dispatcher.
    pub fn execute(
        &self,
        parts: &Parts,
        batch: Batch,
    ) -> BoxFuture<'static, Vec<graphql::Response>> {
        let operations: Vec<_> = batch
            .into_requests()
            .into_iter()
            .enumerate()
            .map(|(index, operation)| {
                let request = execution::Request::builder()
                    .operation(operation)
                    .context(self.context_factory.create(parts))
                    .build();
                execute_operation(
                    self.engine.clone(),
                    index,
                    request,
                    self.expose_internal_errors,
                )
            })
            .collect();

        match self.mode {
            // join_all keeps the results in the order of the operations
            BatchingMode::Parallel => join_all(operations).boxed(),
            BatchingMode::Sequential => async move {
                let mut results = Vec::with_capacity(operations.len());
                for operation in operations {
                    results.push(operation.await);
                }
                results
            }
            .boxed(),
        }
    }
}

async fn execute_operation(
    engine: execution::BoxCloneService,
    index: usize,
    request: execution::Request,
    expose_internal_errors: bool,
) -> graphql::Response {
    let span = tracing::info_span!(
        "graphql_operation",
        graphql.operation.index = index,
        graphql.operation.name = request
            .operation
            .operation_name
            .as_deref()
            .unwrap_or_default(),
    );
    async move {
        match AssertUnwindSafe(engine.oneshot(request)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                tracing::error!(index, %error, "operation failed");
                internal_error(expose_internal_errors.then(|| error.to_string()))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(index, panic = %message, "operation panicked");
                internal_error(expose_internal_errors.then_some(message))
            }
        }
    }
    .instrument(span)
    .await
}

fn internal_error(exception: Option<String>) -> graphql::Response {
    let mut error = graphql::Error::builder()
        .message(INTERNAL_SERVER_ERROR_MESSAGE)
        .extension_code(INTERNAL_SERVER_ERROR_CODE)
        .build();
    if let Some(exception) = exception {
        error
            .extensions
            .insert(ByteString::from("exception"), Value::String(exception.into()));
    }
    graphql::Response::builder().error(error).build()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
