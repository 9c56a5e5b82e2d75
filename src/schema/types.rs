//! Type declarations: named types, fields, arguments and type references

use crate::core::error::SchemaError;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Leaf value types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int,
    Float,
    String,
    Boolean,
    Id,
    /// A declared scalar with no built-in coercion; values pass through
    Custom(String),
}

impl ScalarType {
    pub const BUILT_IN: [ScalarType; 5] = [
        ScalarType::Int,
        ScalarType::Float,
        ScalarType::String,
        ScalarType::Boolean,
        ScalarType::Id,
    ];

    pub fn name(&self) -> &str {
        match self {
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::String => "String",
            ScalarType::Boolean => "Boolean",
            ScalarType::Id => "ID",
            ScalarType::Custom(name) => name,
        }
    }
}

/// A reference to a type from a field or argument declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(of: TypeRef) -> Self {
        TypeRef::List(Box::new(of))
    }

    pub fn non_null(of: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(of))
    }

    pub fn is_nullable(&self) -> bool {
        !matches!(self, TypeRef::NonNull(_))
    }

    /// The named type at the bottom of all list and non-null wrappers
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

impl FromStr for TypeRef {
    type Err = SchemaError;

    /// Parse GraphQL type notation such as `Int!` or `[Post!]`
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| SchemaError::InvalidTypeReference {
            input: input.to_string(),
            message: message.to_string(),
        };

        let s = input.trim();
        if let Some(inner) = s.strip_suffix('!') {
            let inner: TypeRef = inner.parse().map_err(|_| invalid("invalid inner type"))?;
            if !inner.is_nullable() {
                return Err(invalid("duplicate non-null marker"));
            }
            return Ok(TypeRef::non_null(inner));
        }
        if let Some(rest) = s.strip_prefix('[') {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| invalid("unclosed list bracket"))?;
            let inner: TypeRef = inner.parse().map_err(|_| invalid("invalid list item type"))?;
            return Ok(TypeRef::list(inner));
        }
        if s.is_empty() {
            return Err(invalid("empty type name"));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            || s.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(invalid("type names must be GraphQL names"));
        }
        Ok(TypeRef::named(s))
    }
}

/// Declared argument of a field
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Declared field of an object type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub arguments: Vec<ArgumentDef>,
    pub description: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            description: None,
        }
    }

    pub fn argument(mut self, argument: ArgumentDef) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.ty.is_nullable()
    }

    pub fn argument_def(&self, name: &str) -> Option<&ArgumentDef> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Scalar(ScalarType),
    /// Ordered field declarations
    Object(IndexMap<String, FieldDef>),
}

/// A named type of the schema
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
}

impl TypeDef {
    /// Declare a custom scalar
    pub fn scalar(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: TypeKind::Scalar(ScalarType::Custom(name.clone())),
            name,
            description: None,
        }
    }

    pub(crate) fn built_in(scalar: ScalarType) -> Self {
        Self {
            name: scalar.name().to_string(),
            kind: TypeKind::Scalar(scalar),
            description: None,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Object(IndexMap::new()),
            description: None,
        }
    }

    /// Add a field to an object type
    ///
    /// Ignored for scalar types; a later field with the same name replaces the
    /// earlier one but keeps its position. Declarations parsed from SDL or
    /// YAML go through [`TypeDef::try_field`] instead.
    pub fn field(mut self, field: FieldDef) -> Self {
        if let TypeKind::Object(fields) = &mut self.kind {
            fields.insert(field.name.clone(), field);
        }
        self
    }

    /// Add a field, failing if the type already declares one with that name
    pub fn try_field(self, field: FieldDef) -> Result<Self, SchemaError> {
        if self.fields().is_some_and(|fields| fields.contains_key(&field.name)) {
            return Err(SchemaError::DuplicateField {
                type_name: self.name,
                field_name: field.name,
            });
        }
        Ok(self.field(field))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object(_))
    }

    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match &self.kind {
            TypeKind::Object(fields) => Some(fields),
            TypeKind::Scalar(_) => None,
        }
    }
}
