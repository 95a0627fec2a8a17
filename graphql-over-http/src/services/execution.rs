//! The contract between this crate and the GraphQL engine executing operations.
//!
//! An engine is any tower [`Service`](tower::Service) from [`Request`] to [`Response`]. It is
//! cloned for every operation, so cloning should be cheap. Errors returned by the engine, or
//! panics raised while it runs, are turned into a GraphQL error for that operation alone.

use tower::BoxError;

use crate::Context;
use crate::graphql;

pub type BoxService = tower::util::BoxService<Request, Response, BoxError>;
pub type BoxCloneService = tower::util::BoxCloneService<Request, Response, BoxError>;
pub type ServiceResult = Result<Response, BoxError>;

/// The result of one operation, including GraphQL errors raised while executing it.
pub type Response = graphql::Response;

/// One operation to execute.
#[non_exhaustive]
pub struct Request {
    /// The operation, with uploaded files in its variables.
    pub operation: graphql::Request,

    /// The context built for this operation alone.
    pub context: Context,
}

#[buildstructor::buildstructor]
impl Request {
    /// This is the constructor (or builder) to use when constructing a real execution Request.
    #[builder(visibility = "pub")]
    fn new(operation: graphql::Request, context: Context) -> Request {
        Self { operation, context }
    }
}
