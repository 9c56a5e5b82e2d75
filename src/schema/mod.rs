//! Executable schema: type registry plus resolver table
//!
//! ```rust,ignore
//! let schema = Schema::builder()
//!     .sdl("type Post { id: Int! title: String } type Query { post(id: Int!): Post }")
//!     .resolver("Query", "post", resolver::from_async_fn(|call| async move {
//!         posts::fetch(call.args.i64("id")?).await
//!     }))
//!     .build()?;
//! ```

pub mod registry;
pub mod resolver;
pub mod sdl;
pub mod types;

pub use registry::TypeRegistry;
pub use resolver::{
    Arguments, AsyncResolver, Registration, Resolution, Resolver, ResolverCall, ResolverTable,
};
pub use types::{ArgumentDef, FieldDef, ScalarType, TypeDef, TypeKind, TypeRef};

use crate::config::SchemaConfig;
use crate::core::error::SchemaError;
use std::sync::Arc;

/// Immutable, validated schema shared by all requests
#[derive(Debug)]
pub struct Schema {
    registry: TypeRegistry,
    resolvers: ResolverTable,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn resolvers(&self) -> &ResolverTable {
        &self.resolvers
    }

    pub fn type_of(&self, name: &str) -> Option<&TypeDef> {
        self.registry.type_of(name)
    }

    pub fn field_of(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.registry.field_of(type_name, field_name)
    }

    pub fn resolver_for(&self, type_name: &str, field_name: &str) -> Arc<dyn Resolver> {
        self.resolvers.resolver_for(type_name, field_name)
    }
}

/// Collects type declarations and resolvers, validated on [`SchemaBuilder::build`]
#[derive(Default)]
pub struct SchemaBuilder {
    types: Vec<TypeDef>,
    query_type: Option<String>,
    mutation_type: Option<String>,
    resolvers: Vec<Registration>,
    pending_error: Option<SchemaError>,
}

impl SchemaBuilder {
    /// Add the types declared in an SDL document
    ///
    /// A `schema { ... }` block sets the root types unless they were set
    /// explicitly. Syntax errors surface from `build`.
    pub fn sdl(mut self, sdl: &str) -> Self {
        match sdl::parse_sdl(sdl) {
            Ok(definitions) => {
                self.types.extend(definitions.types);
                self.query_type = self.query_type.or(definitions.query_type);
                self.mutation_type = self.mutation_type.or(definitions.mutation_type);
            }
            Err(e) => self.fail(e),
        }
        self
    }

    /// Add the types declared in a YAML schema configuration
    pub fn config(mut self, config: SchemaConfig) -> Self {
        self.query_type = self.query_type.or(Some(config.query.clone()));
        self.mutation_type = self.mutation_type.or(config.mutation.clone());
        match config.into_type_defs() {
            Ok(types) => self.types.extend(types),
            Err(e) => self.fail(e),
        }
        self
    }

    pub fn register_type(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.query_type = Some(name.into());
        self
    }

    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    /// Register the resolver of `type_name.field_name`
    pub fn resolver(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        self.resolvers
            .push((type_name.into(), field_name.into(), resolver));
        self
    }

    fn fail(&mut self, error: SchemaError) {
        if self.pending_error.is_none() {
            self.pending_error = Some(error);
        }
    }

    /// Validate everything and freeze the schema
    ///
    /// The query root defaults to `Query`; the mutation root defaults to
    /// `Mutation` when such a type is declared.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if let Some(error) = self.pending_error {
            return Err(error);
        }

        let query_type = self.query_type.unwrap_or_else(|| "Query".to_string());
        let mutation_type = self.mutation_type.or_else(|| {
            self.types
                .iter()
                .any(|t| t.name == "Mutation")
                .then(|| "Mutation".to_string())
        });

        let registry = TypeRegistry::new(self.types, &query_type, mutation_type.as_deref())?;
        let resolvers = ResolverTable::new(self.resolvers, &registry)?;

        tracing::debug!(
            query = %query_type,
            mutation = ?mutation_type,
            resolvers = resolvers.len(),
            "schema built"
        );

        Ok(Schema {
            registry,
            resolvers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SDL: &str = r#"
        type Post { id: Int! title: String }
        type Query { post(id: Int!): Post posts: [Post] }
        type Mutation { addPost(title: String!): Post! }
    "#;

    #[test]
    fn test_build_from_sdl() {
        let schema = Schema::builder()
            .sdl(SDL)
            .resolver("Query", "post", resolver::constant(json!({"id": 1})))
            .build()
            .unwrap();

        assert_eq!(schema.registry().query_type().name, "Query");
        assert_eq!(schema.registry().mutation_type().unwrap().name, "Mutation");
        assert!(schema.resolvers().is_registered("Query", "post"));
        assert_eq!(schema.field_of("Post", "title").unwrap().ty.to_string(), "String");
    }

    #[test]
    fn test_mutation_root_is_optional() {
        let schema = Schema::builder()
            .sdl("type Query { hello: String }")
            .build()
            .unwrap();
        assert!(schema.registry().mutation_type().is_none());
    }

    #[test]
    fn test_explicit_roots_win_over_schema_block() {
        let schema = Schema::builder()
            .query_type("Root")
            .sdl("type Root { a: Int } type Query { b: Int } schema { query: Query }")
            .build()
            .unwrap();
        assert_eq!(schema.registry().query_type().name, "Root");
    }

    #[test]
    fn test_programmatic_types() {
        let schema = Schema::builder()
            .register_type(
                TypeDef::object("Query").field(FieldDef::new("version", TypeRef::named("String"))),
            )
            .build()
            .unwrap();
        assert!(schema.type_of("Query").is_some());
    }

    #[test]
    fn test_sdl_errors_surface_from_build() {
        let result = Schema::builder().sdl("type Query {").build();
        assert!(matches!(result, Err(SchemaError::Syntax { .. })));
    }

    #[test]
    fn test_resolver_for_unknown_field_fails() {
        let result = Schema::builder()
            .sdl(SDL)
            .resolver("Post", "author", resolver::constant(json!(null)))
            .build();
        assert!(matches!(
            result,
            Err(SchemaError::UnknownResolverTarget { .. })
        ));
    }
}
