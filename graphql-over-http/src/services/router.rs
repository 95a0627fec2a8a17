//! HTTP in, HTTP out.

use tower::BoxError;

pub type Body = axum::body::Body;
pub type Request = http::Request<Body>;
pub type Response = http::Response<Body>;
pub type BoxService = tower::util::BoxService<Request, Response, BoxError>;
pub type BoxCloneService = tower::util::BoxCloneService<Request, Response, BoxError>;
pub type ServiceResult = Result<Response, BoxError>;

pub(crate) mod body;
pub mod formatter;
pub(crate) mod service;
