//! Provide a [`Context`] for each operation handed to the engine.
//!
//! A context is created per operation by a [`ContextFactory`]. It carries request-scoped
//! dependencies for resolvers, either as serializable entries or as typed extensions.

use std::sync::Arc;

use dashmap::DashMap;
use http::request::Parts;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json_bytes::Value;
use tower::BoxError;

use self::extensions::ExtensionsMutex;

pub(crate) mod extensions;

/// Holds [`Context`] entries.
pub(crate) type Entries = Arc<DashMap<String, Value>>;

/// A map of arbitrary JSON values, plus typed extensions, for one operation.
///
/// Cloning a context is cheap and the clone shares its entries, so an engine may hand it to
/// concurrently running resolvers of the same operation.
#[derive(Clone, Debug, Default)]
pub struct Context {
    entries: Entries,
    extensions: ExtensionsMutex,
}

impl Context {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns extensions of the context.
    ///
    /// You can use `Extensions` to pass data that is not serializable.
    pub fn extensions(&self) -> &ExtensionsMutex {
        &self.extensions
    }

    /// Returns true if the context contains a value for the specified key.
    pub fn contains_key<K>(&self, key: K) -> bool
    where
        K: Into<String>,
    {
        self.entries.contains_key(&key.into())
    }

    /// Get a value from the context using the provided key.
    ///
    /// Semantics:
    ///  - If the operation fails, that's because we can't deserialize the value.
    ///  - If the operation succeeds, the value is an [`Option`].
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: for<'de> serde::Deserialize<'de>,
    {
        self.entries
            .get(&key.into())
            .map(|v| serde_json_bytes::from_value(v.value().clone()))
            .transpose()
            .map_err(|e| e.into())
    }

    /// Insert a value int the context using the provided key and value.
    ///
    /// Semantics:
    ///  - If the operation fails, then the pair has not been inserted.
    ///  - If the operation succeeds, the result is the old value as an [`Option`].
    pub fn insert<K, V>(&self, key: K, value: V) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: DeserializeOwned + Serialize,
    {
        match serde_json_bytes::to_value(value) {
            Ok(value) => self
                .entries
                .insert(key.into(), value)
                .map(|v| serde_json_bytes::from_value(v))
                .transpose()
                .map_err(|e| e.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Upsert a value in the context using the provided key and resolving
    /// function.
    ///
    /// The resolving function must yield a value to be used in the context. It
    /// is provided with the current value to use in evaluating which value to
    /// yield.
    ///
    /// Semantics:
    ///  - If the operation fails, then the pair has not been inserted (or a current
    ///    value updated).
    ///  - If the operation succeeds, the pair have either updated an existing value
    ///    or been inserted.
    pub fn upsert<K, V>(&self, key: K, upsert: impl FnOnce(V) -> V) -> Result<(), BoxError>
    where
        K: Into<String>,
        V: for<'de> serde::Deserialize<'de> + Serialize + Default,
    {
        let key = key.into();
        self.entries
            .entry(key.clone())
            .or_try_insert_with(|| serde_json_bytes::to_value::<V>(Default::default()))?;
        let mut result = Ok(());
        self.entries
            .alter(&key, |_, v| match serde_json_bytes::from_value(v.clone()) {
                Ok(value) => match serde_json_bytes::to_value((upsert)(value)) {
                    Ok(value) => value,
                    Err(e) => {
                        result = Err(e);
                        v
                    }
                },
                Err(e) => {
                    result = Err(e);
                    v
                }
            });
        result.map_err(|e| e.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the [`Context`] of each operation from the HTTP request it came in.
///
/// Implemented for any `Fn(&http::request::Parts) -> Context`. The factory is invoked once
/// per operation, so operations of the same batch never share a context unless the factory
/// hands out shared state on purpose.
pub trait ContextFactory: Send + Sync + 'static {
    fn create(&self, parts: &Parts) -> Context;
}

impl<F> ContextFactory for F
where
    F: Fn(&Parts) -> Context + Send + Sync + 'static,
{
    fn create(&self, parts: &Parts) -> Context {
        (self)(parts)
    }
}

/// The default [`ContextFactory`]: every operation gets an empty [`Context`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyContext;

impl ContextFactory for EmptyContext {
    fn create(&self, _parts: &Parts) -> Context {
        Context::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> Parts {
        http::Request::post("/graphql")
            .header("x-user", "ada")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_context_insert() {
        let c = Context::new();
        assert!(c.insert("key1", 1).is_ok());
        assert_eq!(c.get("key1").unwrap(), Some(1));
        assert!(c.contains_key("key1"));
    }

    #[test]
    fn test_context_overwrite() {
        let c = Context::new();
        assert!(c.insert("overwrite", 2).is_ok());
        assert_eq!(c.insert("overwrite", 3).unwrap(), Some(2));
        assert_eq!(c.get("overwrite").unwrap(), Some(3));
    }

    #[test]
    fn test_context_upsert() {
        let c = Context::new();
        assert!(c.insert("present", 1).is_ok());
        assert!(c.upsert("present", |v: usize| v + 1).is_ok());
        assert_eq!(c.get("present").unwrap(), Some(2));
        assert!(c.upsert("not_present", |v: usize| v + 1).is_ok());
        assert_eq!(c.get("not_present").unwrap(), Some(1));
    }

    #[test]
    fn test_context_marshall_errors() {
        let c = Context::new();
        assert!(c.insert("string", "Some value".to_string()).is_ok());
        assert!(c.upsert("string", |v: usize| v + 1).is_err());
        assert!(c.get::<_, usize>("string").is_err());
    }

    #[test]
    fn test_context_extensions() {
        #[derive(Clone, Debug, PartialEq)]
        struct Loader(u32);

        let c = Context::new();
        c.extensions().with_lock(|mut lock| lock.insert(Loader(7)));
        let clone = c.clone();
        assert_eq!(
            clone
                .extensions()
                .with_lock(|lock| lock.get::<Loader>().map(|l| l.0)),
            Some(7)
        );
    }

    #[test]
    fn closures_are_factories() {
        let factory = |parts: &Parts| {
            let context = Context::new();
            let user = parts
                .headers
                .get("x-user")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            context.insert("user", user).unwrap();
            context
        };
        let context = factory.create(&parts());
        assert_eq!(
            context.get::<_, Option<String>>("user").unwrap(),
            Some(Some("ada".to_string()))
        );
    }

    #[test]
    fn empty_context_factory() {
        let first = EmptyContext.create(&parts());
        let second = EmptyContext.create(&parts());
        first.insert("seen", true).unwrap();
        assert!(first.contains_key("seen"));
        assert!(second.is_empty());
    }
}
