//! Core types shared by the schema, the executor and the HTTP layer

pub mod auth;
pub mod context;
pub mod error;

pub use auth::{AuthContext, AuthPolicy, AuthProvider, HeaderAuthProvider, NoAuthProvider};
pub use context::RequestContext;
pub use error::{ExecutionError, ResolverError, SchemaError, TimeoutError, ValidationError};
