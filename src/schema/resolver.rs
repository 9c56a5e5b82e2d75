//! Resolvers and the resolver table
//!
//! A resolver produces the value of one field from the value of its parent,
//! the coerced field arguments and the request context. It may answer right
//! away ([`Resolution::Ready`]) or hand back a future
//! ([`Resolution::Deferred`]) when it needs to wait on I/O.
//!
//! ```rust,ignore
//! let post = resolver::from_async_fn(|call| async move {
//!     let id = call.args.i64("id")?;
//!     fetch_post(id).await
//! });
//! let title = resolver::from_fn(|call| {
//!     Ok(call.parent.get("title").cloned().unwrap_or_default())
//! });
//! ```

use super::registry::TypeRegistry;
use crate::core::context::RequestContext;
use crate::core::error::SchemaError;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};

/// Coerced arguments of a field, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn i64(&self, name: &str) -> Result<i64> {
        self.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| anyhow!("Argument \"{}\" is not an integer", name))
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Argument \"{}\" is not a string", name))
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| anyhow!("Argument \"{}\" is not a boolean", name))
    }

    /// Deserialize all arguments into a typed struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .context("Failed to deserialize field arguments")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Everything a resolver receives for one invocation
#[derive(Debug, Clone)]
pub struct ResolverCall {
    /// Value of the parent object (the root value for top-level fields)
    pub parent: Arc<Value>,
    pub args: Arguments,
    pub context: Arc<RequestContext>,
    pub type_name: String,
    pub field_name: String,
}

/// Outcome of calling a resolver
pub enum Resolution {
    /// The value is already known
    Ready(Result<Value>),

    /// The value will be known once the future completes
    Deferred(BoxFuture<'static, Result<Value>>),
}

impl From<Result<Value>> for Resolution {
    fn from(result: Result<Value>) -> Self {
        Resolution::Ready(result)
    }
}

impl From<Value> for Resolution {
    fn from(value: Value) -> Self {
        Resolution::Ready(Ok(value))
    }
}

/// A field resolver
pub trait Resolver: Send + Sync {
    fn resolve(&self, call: ResolverCall) -> Resolution;
}

/// A resolver that is always asynchronous
///
/// Implement this for resolvers that hold state, such as a REST client, and
/// register them with [`from_async`].
#[async_trait]
pub trait AsyncResolver: Send + Sync {
    async fn resolve(&self, call: ResolverCall) -> Result<Value>;
}

struct SyncFn<F>(F);

impl<F> Resolver for SyncFn<F>
where
    F: Fn(ResolverCall) -> Result<Value> + Send + Sync,
{
    fn resolve(&self, call: ResolverCall) -> Resolution {
        Resolution::Ready((self.0)(call))
    }
}

struct AsyncFn<F>(F);

impl<F, Fut> Resolver for AsyncFn<F>
where
    F: Fn(ResolverCall) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn resolve(&self, call: ResolverCall) -> Resolution {
        Resolution::Deferred((self.0)(call).boxed())
    }
}

struct AsyncAdapter<R>(Arc<R>);

impl<R: AsyncResolver + 'static> Resolver for AsyncAdapter<R> {
    fn resolve(&self, call: ResolverCall) -> Resolution {
        let resolver = self.0.clone();
        Resolution::Deferred(async move { resolver.resolve(call).await }.boxed())
    }
}

/// Resolver from a synchronous closure
pub fn from_fn<F>(f: F) -> Arc<dyn Resolver>
where
    F: Fn(ResolverCall) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(SyncFn(f))
}

/// Resolver from a closure returning a future
pub fn from_async_fn<F, Fut>(f: F) -> Arc<dyn Resolver>
where
    F: Fn(ResolverCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(AsyncFn(f))
}

/// Resolver from an [`AsyncResolver`] implementation
pub fn from_async<R: AsyncResolver + 'static>(resolver: R) -> Arc<dyn Resolver> {
    Arc::new(AsyncAdapter(Arc::new(resolver)))
}

/// Resolver that always yields `value`
pub fn constant(value: Value) -> Arc<dyn Resolver> {
    from_fn(move |_| Ok(value.clone()))
}

/// Reads the property named like the field off the parent value
///
/// A null parent, a non-object parent or a missing property all yield null.
struct PropertyResolver;

impl Resolver for PropertyResolver {
    fn resolve(&self, call: ResolverCall) -> Resolution {
        let value = call
            .parent
            .get(&call.field_name)
            .cloned()
            .unwrap_or(Value::Null);
        Resolution::Ready(Ok(value))
    }
}

static PROPERTY_RESOLVER: LazyLock<Arc<dyn Resolver>> =
    LazyLock::new(|| Arc::new(PropertyResolver));

/// Registration input: (type name, field name, resolver)
pub type Registration = (String, String, Arc<dyn Resolver>);

/// Resolvers keyed by (type name, field name)
///
/// Built once at schema construction and read-only afterwards.
#[derive(Clone, Default)]
pub struct ResolverTable {
    entries: HashMap<String, HashMap<String, Arc<dyn Resolver>>>,
}

impl ResolverTable {
    /// Build the table, rejecting duplicates and entries the registry does not declare
    pub fn new(
        registrations: Vec<Registration>,
        registry: &TypeRegistry,
    ) -> Result<Self, SchemaError> {
        let mut entries: HashMap<String, HashMap<String, Arc<dyn Resolver>>> = HashMap::new();

        for (type_name, field_name, resolver) in registrations {
            if registry.field_of(&type_name, &field_name).is_none() {
                return Err(SchemaError::UnknownResolverTarget {
                    type_name,
                    field_name,
                });
            }

            let fields = entries.entry(type_name.clone()).or_default();
            if fields.contains_key(&field_name) {
                return Err(SchemaError::DuplicateResolver {
                    type_name,
                    field_name,
                });
            }
            fields.insert(field_name, resolver);
        }

        Ok(Self { entries })
    }

    /// The registered resolver, or the property-read default
    pub fn resolver_for(&self, type_name: &str, field_name: &str) -> Arc<dyn Resolver> {
        self.entries
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .cloned()
            .unwrap_or_else(|| PROPERTY_RESOLVER.clone())
    }

    pub fn is_registered(&self, type_name: &str, field_name: &str) -> bool {
        self.entries
            .get(type_name)
            .is_some_and(|fields| fields.contains_key(field_name))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResolverTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut coordinates: Vec<String> = self
            .entries
            .iter()
            .flat_map(|(t, fields)| fields.keys().map(move |field| format!("{}.{}", t, field)))
            .collect();
        coordinates.sort();
        f.debug_struct("ResolverTable")
            .field("resolvers", &coordinates)
            .finish()
    }
}
