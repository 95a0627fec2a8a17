//! Implementation of the steps of request processing.
//!
//! * [`router`]: an HTTP request in, an HTTP response out.
//! * [`dispatch`]: the operations of a request, run against the engine.
//! * [`execution`]: the engine contract, one operation at a time.

pub use self::dispatch::ExecutionDispatcher;
pub(crate) use self::router::service::RouterService;

pub mod dispatch;
pub mod execution;
pub mod router;
