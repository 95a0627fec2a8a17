//! Synchronous checkpoint.
//!
//! Provides a general mechanism for controlling the flow of a request. Useful in any situation
//! where the caller wishes to decide, from the request alone, whether it reaches the inner
//! service: authentication, header validation, rate limiting by a precomputed budget.
//!
//! If the checkpoint returns `ControlFlow::Break`, the response it holds is returned and the
//! inner service is never called. If it returns `ControlFlow::Continue`, the request it holds is
//! passed on.

use std::ops::ControlFlow;
use std::sync::Arc;

use futures::future::BoxFuture;
use tower::BoxError;
use tower::Layer;
use tower::Service;

type CheckpointFn<S, Request> = Arc<
    dyn Fn(
            Request,
        ) -> Result<
            ControlFlow<<S as Service<Request>>::Response, Request>,
            <S as Service<Request>>::Error,
        > + Send
        + Sync
        + 'static,
>;

/// [`Layer`] for synchronous checkpoints. See [`ServiceBuilderExt::checkpoint()`](crate::layers::ServiceBuilderExt::checkpoint()).
pub struct CheckpointLayer<S, Request>
where
    S: Service<Request> + Send + 'static,
    Request: Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
{
    checkpoint_fn: CheckpointFn<S, Request>,
}

impl<S, Request> CheckpointLayer<S, Request>
where
    S: Service<Request> + Send + 'static,
    Request: Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
{
    /// Create a `CheckpointLayer` from a function that takes a request and returns a `ControlFlow`.
    pub fn new(
        checkpoint_fn: impl Fn(
            Request,
        ) -> Result<
            ControlFlow<<S as Service<Request>>::Response, Request>,
            <S as Service<Request>>::Error,
        > + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            checkpoint_fn: Arc::new(checkpoint_fn),
        }
    }
}

impl<S, Request> Layer<S> for CheckpointLayer<S, Request>
where
    S: Service<Request> + Send + 'static,
    Request: Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
{
    type Service = CheckpointService<S, Request>;

    fn layer(&self, service: S) -> Self::Service {
        CheckpointService {
            checkpoint_fn: self.checkpoint_fn.clone(),
            inner: service,
        }
    }
}

/// [`Service`] for synchronous checkpoints. See [`ServiceBuilderExt::checkpoint()`](crate::layers::ServiceBuilderExt::checkpoint()).
pub struct CheckpointService<S, Request>
where
    Request: Send + 'static,
    S: Service<Request> + Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
{
    inner: S,
    checkpoint_fn: CheckpointFn<S, Request>,
}

impl<S, Request> Clone for CheckpointService<S, Request>
where
    Request: Send + 'static,
    S: Service<Request> + Clone + Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            checkpoint_fn: self.checkpoint_fn.clone(),
        }
    }
}

impl<S, Request> Service<Request> for CheckpointService<S, Request>
where
    S: Service<Request> + Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
    Request: Send + 'static,
{
    type Response = <S as Service<Request>>::Response;

    type Error = <S as Service<Request>>::Error;

    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        match (self.checkpoint_fn)(req) {
            Ok(ControlFlow::Break(response)) => Box::pin(async move { Ok(response) }),
            Ok(ControlFlow::Continue(request)) => Box::pin(self.inner.call(request)),
            Err(error) => Box::pin(async move { Err(error) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use tower::ServiceBuilder;
    use tower::ServiceExt;
    use tower::service_fn;

    use super::*;
    use crate::layers::ServiceBuilderExt;
    use crate::services::router;

    type Checkpoint = Result<ControlFlow<router::Response, router::Request>, BoxError>;

    fn inner() -> router::BoxCloneService {
        service_fn(|_request: router::Request| async {
            Ok::<_, BoxError>(
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(router::Body::from("inner"))?,
            )
        })
        .boxed_clone()
    }

    fn request(authorization: Option<&str>) -> router::Request {
        let mut builder = http::Request::post("/graphql");
        if let Some(authorization) = authorization {
            builder = builder.header("authorization", authorization);
        }
        builder.body(router::Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_service_continue() {
        let service = ServiceBuilder::new()
            .checkpoint(|req: router::Request| -> Checkpoint { Ok(ControlFlow::Continue(req)) })
            .service(inner());

        let response = service.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_service_break() {
        let service = ServiceBuilder::new()
            .checkpoint(|req: router::Request| -> Checkpoint {
                if req.headers().contains_key("authorization") {
                    Ok(ControlFlow::Continue(req))
                } else {
                    Ok(ControlFlow::Break(
                        http::Response::builder()
                            .status(StatusCode::UNAUTHORIZED)
                            .body(router::Body::empty())?,
                    ))
                }
            })
            .service(inner());

        let response = service.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = service.oneshot(request(Some("Bearer t"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_double_checkpoint() {
        let service = ServiceBuilder::new()
            .checkpoint(|req: router::Request| -> Checkpoint { Ok(ControlFlow::Continue(req)) })
            .checkpoint(|_req: router::Request| -> Checkpoint {
                Ok(ControlFlow::Break(
                    http::Response::builder()
                        .status(StatusCode::FORBIDDEN)
                        .body(router::Body::empty())?,
                ))
            })
            .service(inner());

        let response = service.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_checkpoint_error() {
        let service = ServiceBuilder::new()
            .checkpoint(|_req: router::Request| -> Checkpoint { Err("checkpoint failed".into()) })
            .service(inner());

        let error = service.oneshot(request(None)).await.unwrap_err();
        assert_eq!(error.to_string(), "checkpoint failed");
    }
}
