//! Axum http server factory. Axum provides routing capability on top of Hyper HTTP.

use std::future::Future;

use axum::Extension;
use axum::Router;
use axum::response::IntoResponse;
use axum::routing::any;
use futures::FutureExt;
use futures::future::BoxFuture;
use http::StatusCode;
use tokio::net::TcpListener;
use tower::BoxError;
use tower::ServiceBuilder;
use tower::ServiceExt;
use tower::buffer::Buffer;

use crate::Configuration;
use crate::layers::ServiceBuilderExt;
use crate::services::router;

type SharedService = Buffer<router::BoxCloneService, router::Request>;

/// Routes every method of the configured GraphQL path to `service`.
///
/// Method and content type checks belong to `service`, so a `GET` is answered by it rather
/// than by axum. Must be called from within a Tokio runtime.
pub fn make_router(configuration: &Configuration, service: router::BoxCloneService) -> Router {
    let service: SharedService = ServiceBuilder::new().buffered().service(service);
    Router::new()
        .route(configuration.path(), any(handle_graphql))
        .layer(Extension(service))
}

fn handle_graphql(
    Extension(service): Extension<SharedService>,
    request: router::Request,
) -> BoxFuture<'static, axum::response::Response> {
    Box::pin(service.oneshot(request).map(|response| {
        let response: Result<router::Response, BoxError> =
            response.map_err(|error: BoxError| -> BoxError { error });
        match response {
            Ok(response) => response.into_response(),
            Err(error) => {
                tracing::error!(%error, "router service call failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }))
}

/// Binds the configured listen address.
pub async fn listen(configuration: &Configuration) -> std::io::Result<TcpListener> {
    TcpListener::bind(configuration.listen()).await
}

/// Serves `router` on `listener` until `shutdown` completes, then waits for in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    tracing::info!(address = %listener.local_addr()?, "GraphQL endpoint exposed");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
