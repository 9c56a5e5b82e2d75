//! # fieldwise
//!
//! A schema-driven query execution engine for GraphQL-style requests.
//!
//! ## Features
//!
//! - **Schema Registry**: object types, scalars and root types declared in SDL,
//!   YAML or code, validated once and shared read-only
//! - **Resolver Table**: one resolver per (type, field), with a property-read default
//! - **Concurrent Execution**: sibling fields and list elements resolve concurrently,
//!   results keep selection order
//! - **Partial Results**: field errors are collected with their response path and
//!   nulls propagate to the nearest nullable position
//! - **HTTP Exposure**: an axum router serving `POST /graphql`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldwise::prelude::*;
//!
//! let schema = Schema::builder()
//!     .sdl("type Post { id: Int! title: String } type Query { post(id: Int!): Post }")
//!     .resolver("Query", "post", resolver::from_async_fn(|call| async move {
//!         let id = call.args.i64("id")?;
//!         Ok(json!({ "id": id, "title": "Hello" }))
//!     }))
//!     .build()?;
//!
//! let executor = Executor::new(Arc::new(schema), ExecutorConfig::default());
//! let response = executor.execute_query("{ post(id: 1) { title } }", Map::new()).await;
//! assert_eq!(response.to_json(), json!({ "data": { "post": { "title": "Hello" } } }));
//! ```

pub mod config;
pub mod core;
pub mod execution;
#[cfg(feature = "rest")]
pub mod rest;
pub mod schema;
pub mod server;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy, AuthProvider, HeaderAuthProvider, NoAuthProvider},
        context::RequestContext,
        error::{ExecutionError, ResolverError, SchemaError, TimeoutError, ValidationError},
    };

    // === Schema ===
    pub use crate::schema::{
        ArgumentDef, Arguments, AsyncResolver, FieldDef, Resolution, Resolver, ResolverCall,
        ScalarType, Schema, SchemaBuilder, TypeDef, TypeRef, resolver,
    };

    // === Execution ===
    pub use crate::execution::{
        Document, Executor, GraphQLError, InputValue, Operation, Request, ResponseEnvelope,
        ResponsePath, SelectionNode,
    };

    // === Config ===
    pub use crate::config::{ExecutorConfig, MutationPolicy, SchemaConfig};

    // === Server ===
    pub use crate::server::GraphQLExposure;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Map, Value, json};
    pub use std::sync::Arc;
}
