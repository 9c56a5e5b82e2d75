//! Configuration loading and management
//!
//! Two documents are understood, both YAML:
//!
//! ```yaml
//! # executor settings
//! timeout_ms: 5000
//! mutation_policy: sequential
//! ```
//!
//! ```yaml
//! # schema declarations
//! query: Query
//! mutation: Mutation
//! types:
//!   - name: Post
//!     fields:
//!       - name: id
//!         type: Int!
//!   - name: Query
//!     fields:
//!       - name: post
//!         type: Post
//!         args:
//!           - name: id
//!             type: Int!
//! ```

use crate::core::error::SchemaError;
use crate::schema::types::{ArgumentDef, FieldDef, TypeDef, TypeRef};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How top-level mutation fields of one request are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    /// One after another, in request order
    #[default]
    Sequential,

    /// Concurrently, like query fields
    Concurrent,
}

/// Settings of an [`Executor`](crate::execution::Executor)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Deadline for a whole request, in milliseconds (no deadline when absent)
    pub timeout_ms: Option<u64>,

    pub mutation_policy: MutationPolicy,
}

impl ExecutorConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_mutation_policy(mut self, policy: MutationPolicy) -> Self {
        self.mutation_policy = policy;
        self
    }
}

/// Declared argument of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentConfig {
    pub name: String,

    /// GraphQL type notation, e.g. `Int!`
    #[serde(rename = "type")]
    pub type_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// Declared field of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub type_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentConfig>,
}

/// Declared object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub fields: Vec<FieldConfig>,
}

/// Complete schema declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Query root type name
    #[serde(default = "default_query_type")]
    pub query: String,

    /// Mutation root type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<String>,

    /// Custom scalar names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scalars: Vec<String>,

    pub types: Vec<TypeConfig>,
}

fn default_query_type() -> String {
    "Query".to_string()
}

impl SchemaConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Convert the declarations into type definitions
    ///
    /// Fails on malformed type notation; reference checks happen when the
    /// registry is built.
    pub fn into_type_defs(self) -> Result<Vec<TypeDef>, SchemaError> {
        let mut defs: Vec<TypeDef> = self.scalars.into_iter().map(TypeDef::scalar).collect();

        for type_config in self.types {
            let mut def = TypeDef::object(type_config.name);
            def.description = type_config.description;

            for field_config in type_config.fields {
                let mut field = FieldDef::new(field_config.name, field_config.type_ref.parse()?);
                field.description = field_config.description;

                for arg_config in field_config.args {
                    let ty: TypeRef = arg_config.type_ref.parse()?;
                    let mut arg = ArgumentDef::new(arg_config.name, ty);
                    arg.default_value = arg_config.default;
                    field = field.argument(arg);
                }
                def = def.try_field(field)?;
            }
            defs.push(def);
        }

        Ok(defs)
    }
}
