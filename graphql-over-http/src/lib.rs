//! Serves a GraphQL execution engine over HTTP.
//!
//! Incoming bodies are turned into one or more GraphQL operations (plain JSON, batched JSON or
//! the [multipart request] convention for file uploads), executed against an engine supplied by
//! the embedding application, and the results are serialized back into a single HTTP response
//! that mirrors the shape of the request.
//!
//! ```text
//! HTTP body ─┬─ application/json ───────────────────────────┐
//!            └─ multipart/form-data ── file_uploads (map) ──┴─ batching ── dispatch ── response
//! ```
//!
//! [multipart request]: https://github.com/jaydenseric/graphql-multipart-request-spec

pub mod axum_factory;
pub mod batching;
pub mod configuration;
mod context;
pub mod error;
pub mod file_uploads;
pub mod graphql;
pub mod json_ext;
pub mod layers;
mod router_factory;
pub mod services;

pub use configuration::Configuration;
pub use context::Context;
pub use context::ContextFactory;
pub use context::EmptyContext;
pub use context::extensions::ExtensionsGuard;
pub use context::extensions::ExtensionsMutex;
pub use router_factory::RouterCreator;
pub use router_factory::RouterCreatorBuilder;
pub use router_factory::Stage;
