//! Lowering of schema definition language into type declarations
//!
//! Parsing is delegated to `graphql-parser`; this module only maps its AST
//! onto [`TypeDef`]s. Object types, custom scalars, descriptions, argument
//! defaults and the `schema { query mutation }` block are understood.
//! Interfaces, unions, enums, input objects and extensions are rejected.
//!
//! [`print_sdl`] goes the other way and renders a registry as SDL text.

use super::registry::TypeRegistry;
use super::types::{ArgumentDef, FieldDef, ScalarType, TypeDef, TypeKind, TypeRef};
use crate::core::error::SchemaError;
use graphql_parser::query::Value as GqlValue;
use graphql_parser::schema::{self as ast, Definition, TypeDefinition, parse_schema};
use serde_json::{Map, Value, json};
use std::fmt::Write;

/// Declarations found in one SDL document
#[derive(Debug, Default)]
pub struct SdlDefinitions {
    pub types: Vec<TypeDef>,
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
}

pub fn parse_sdl(sdl: &str) -> Result<SdlDefinitions, SchemaError> {
    let document = parse_schema::<String>(sdl).map_err(|e| SchemaError::Syntax {
        message: e.to_string(),
    })?;

    let mut definitions = SdlDefinitions::default();
    for definition in document.definitions {
        match definition {
            Definition::SchemaDefinition(schema) => {
                if schema.subscription.is_some() {
                    return Err(unsupported("subscription root type"));
                }
                definitions.query_type = schema.query;
                definitions.mutation_type = schema.mutation;
            }
            Definition::TypeDefinition(TypeDefinition::Scalar(scalar)) => {
                let mut def = TypeDef::scalar(scalar.name);
                def.description = scalar.description;
                definitions.types.push(def);
            }
            Definition::TypeDefinition(TypeDefinition::Object(object)) => {
                definitions.types.push(lower_object(object)?);
            }
            Definition::TypeDefinition(other) => {
                let kind = match other {
                    TypeDefinition::Interface(_) => "interface",
                    TypeDefinition::Union(_) => "union",
                    TypeDefinition::Enum(_) => "enum",
                    _ => "input object",
                };
                return Err(unsupported(kind));
            }
            Definition::TypeExtension(_) => return Err(unsupported("type extension")),
            Definition::DirectiveDefinition(_) => return Err(unsupported("directive definition")),
        }
    }

    Ok(definitions)
}

fn unsupported(what: &str) -> SchemaError {
    SchemaError::Unsupported {
        message: format!("{} definitions are not supported", what),
    }
}

fn lower_object(object: ast::ObjectType<'_, String>) -> Result<TypeDef, SchemaError> {
    if !object.implements_interfaces.is_empty() {
        return Err(unsupported("interface"));
    }

    let mut def = TypeDef::object(object.name);
    def.description = object.description;

    for field in object.fields {
        let mut field_def = FieldDef::new(field.name, lower_type(&field.field_type));
        field_def.description = field.description;

        for input in field.arguments {
            let mut arg = ArgumentDef::new(input.name.clone(), lower_type(&input.value_type));
            if let Some(default) = &input.default_value {
                let value = const_value_to_json(default).map_err(|message| {
                    SchemaError::InvalidTypeReference {
                        input: format!("{}.{}({}:)", def.name, field_def.name, input.name),
                        message,
                    }
                })?;
                arg = arg.with_default(value);
            }
            field_def = field_def.argument(arg);
        }

        def = def.try_field(field_def)?;
    }

    Ok(def)
}

pub(crate) fn lower_type(ty: &ast::Type<'_, String>) -> TypeRef {
    match ty {
        ast::Type::NamedType(name) => TypeRef::named(name.clone()),
        ast::Type::ListType(inner) => TypeRef::list(lower_type(inner)),
        ast::Type::NonNullType(inner) => TypeRef::non_null(lower_type(inner)),
    }
}

/// Convert a constant GraphQL value (no variables) to JSON
pub(crate) fn const_value_to_json(value: &GqlValue<'_, String>) -> Result<Value, String> {
    Ok(match value {
        GqlValue::Null => Value::Null,
        GqlValue::Int(i) => json!(i.as_i64().ok_or("integer out of range")?),
        GqlValue::Float(f) => json!(f),
        GqlValue::String(s) => json!(s),
        GqlValue::Boolean(b) => json!(b),
        GqlValue::Enum(e) => json!(e),
        GqlValue::List(list) => Value::Array(
            list.iter()
                .map(const_value_to_json)
                .collect::<Result<_, _>>()?,
        ),
        GqlValue::Object(obj) => {
            let mut map = Map::new();
            for (k, v) in obj {
                map.insert(k.clone(), const_value_to_json(v)?);
            }
            Value::Object(map)
        }
        GqlValue::Variable(name) => {
            return Err(format!("variable ${} is not allowed in a constant", name));
        }
    })
}

/// Render a registry as SDL, built-in scalars omitted
pub fn print_sdl(registry: &TypeRegistry) -> String {
    let mut out = String::new();

    for def in registry.types() {
        if let Some(description) = &def.description {
            let _ = writeln!(out, "{}", quote(description));
        }
        match &def.kind {
            TypeKind::Scalar(ScalarType::Custom(name)) => {
                let _ = writeln!(out, "scalar {}\n", name);
            }
            TypeKind::Scalar(_) => continue,
            TypeKind::Object(fields) => {
                let _ = writeln!(out, "type {} {{", def.name);
                for field in fields.values() {
                    if let Some(description) = &field.description {
                        let _ = writeln!(out, "  {}", quote(description));
                    }
                    let _ = writeln!(out, "  {}{}: {}", field.name, print_arguments(field), field.ty);
                }
                out.push_str("}\n\n");
            }
        }
    }

    let _ = writeln!(out, "schema {{\n  query: {}", registry.query_type().name);
    if let Some(mutation) = registry.mutation_type() {
        let _ = writeln!(out, "  mutation: {}", mutation.name);
    }
    out.push_str("}\n");
    out
}

fn print_arguments(field: &FieldDef) -> String {
    if field.arguments.is_empty() {
        return String::new();
    }
    let args: Vec<String> = field
        .arguments
        .iter()
        .map(|arg| match &arg.default_value {
            Some(default) => format!("{}: {} = {}", arg.name, arg.ty, print_value(default)),
            None => format!("{}: {}", arg.name, arg.ty),
        })
        .collect();
    format!("({})", args.join(", "))
}

/// GraphQL literal syntax: object keys are bare names
fn print_value(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{}: {}", key, print_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}
