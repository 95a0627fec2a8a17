use std::sync::Arc;

use tower::BoxError;
use tower::Layer;
use tower::Service;
use tower::ServiceExt;

use crate::Configuration;
use crate::ContextFactory;
use crate::EmptyContext;
use crate::axum_factory;
use crate::error::ConfigurationError;
use crate::graphql;
use crate::services::ExecutionDispatcher;
use crate::services::RouterService;
use crate::services::execution;
use crate::services::router;

/// Wraps the HTTP service in an extra layer: authentication, header checks, rate limiting.
pub type Stage =
    Box<dyn Fn(router::BoxCloneService) -> router::BoxCloneService + Send + Sync + 'static>;

/// Creates the HTTP service in front of an execution engine.
///
/// Each call to [`RouterCreator::create`] returns a service sharing the same engine, context
/// factory and configuration.
#[derive(Clone)]
pub struct RouterCreator {
    configuration: Arc<Configuration>,
    dispatcher: ExecutionDispatcher,
    stages: Arc<Vec<Stage>>,
}

impl RouterCreator {
    /// Starts building a creator around `engine`, which executes one operation per call.
    pub fn builder<S>(engine: S) -> RouterCreatorBuilder
    where
        S: Service<execution::Request, Response = graphql::Response> + Clone + Send + 'static,
        S::Error: Into<BoxError>,
        S::Future: Send + 'static,
    {
        RouterCreatorBuilder {
            engine: engine
                .map_err(|error: S::Error| -> BoxError { error.into() })
                .boxed_clone(),
            context_factory: Arc::new(EmptyContext),
            configuration: None,
            stages: Vec::new(),
        }
    }

    /// A new HTTP service. Stages wrap it in the order they were added, the first one being
    /// the outermost.
    pub fn create(&self) -> router::BoxCloneService {
        let service =
            RouterService::new(self.dispatcher.clone(), self.configuration.clone()).boxed_clone();
        self.stages
            .iter()
            .rev()
            .fold(service, |service, stage| stage(service))
    }

    /// An [`axum::Router`] serving [`RouterCreator::create`] on the configured path.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn make_router(&self) -> axum::Router {
        axum_factory::make_router(&self.configuration, self.create())
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}

/// Builder for [`RouterCreator`].
pub struct RouterCreatorBuilder {
    engine: execution::BoxCloneService,
    context_factory: Arc<dyn ContextFactory>,
    configuration: Option<Configuration>,
    stages: Vec<Stage>,
}

impl RouterCreatorBuilder {
    /// Sets how the [`Context`](crate::Context) of each operation is built. Defaults to
    /// [`EmptyContext`].
    pub fn context_factory(mut self, context_factory: impl ContextFactory) -> Self {
        self.context_factory = Arc::new(context_factory);
        self
    }

    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Adds a stage around the HTTP service.
    pub fn stage(
        mut self,
        stage: impl Fn(router::BoxCloneService) -> router::BoxCloneService + Send + Sync + 'static,
    ) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Adds a [`Layer`] around the HTTP service, as built with
    /// [`ServiceBuilderExt`](crate::layers::ServiceBuilderExt).
    pub fn layer<L>(self, layer: L) -> Self
    where
        L: Layer<router::BoxCloneService> + Send + Sync + 'static,
        L::Service: Service<router::Request, Response = router::Response, Error = BoxError>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<router::Request>>::Future: Send + 'static,
    {
        self.stage(move |service| layer.layer(service).boxed_clone())
    }

    pub fn build(self) -> Result<RouterCreator, ConfigurationError> {
        let configuration = self.configuration.unwrap_or_default();
        configuration.validate()?;
        let dispatcher = ExecutionDispatcher::new(
            self.engine,
            self.context_factory,
            configuration.batching.mode,
            configuration.expose_internal_errors,
        );
        Ok(RouterCreator {
            configuration: Arc::new(configuration),
            dispatcher,
            stages: Arc::new(self.stages),
        })
    }
}
