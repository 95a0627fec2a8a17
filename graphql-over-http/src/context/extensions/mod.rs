pub(crate) mod sync;

pub use http::Extensions;
pub use sync::ExtensionsGuard;
pub use sync::ExtensionsMutex;
