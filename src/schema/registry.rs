//! Type registry: the validated, immutable set of named types

use super::types::{FieldDef, ScalarType, TypeDef, TypeKind, TypeRef};
use crate::core::error::SchemaError;
use indexmap::IndexMap;

/// All named types of a schema plus its root operation types
///
/// Built once by [`TypeRegistry::new`] and never mutated afterwards, so a
/// registry can be shared between concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDef>,
    query_type: String,
    mutation_type: Option<String>,
}

impl TypeRegistry {
    /// Validate and register `types` alongside the built-in scalars
    ///
    /// Fails when two types share a name, when a field or argument references
    /// an unknown type, when an argument is not scalar, when an object has no
    /// fields, or when a root type is missing or not an object.
    pub fn new(
        types: Vec<TypeDef>,
        query_type: &str,
        mutation_type: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let mut registered: IndexMap<String, TypeDef> = ScalarType::BUILT_IN
            .into_iter()
            .map(|scalar| {
                let def = TypeDef::built_in(scalar);
                (def.name.clone(), def)
            })
            .collect();

        for def in types {
            if registered.contains_key(&def.name) {
                return Err(SchemaError::DuplicateType { name: def.name });
            }
            registered.insert(def.name.clone(), def);
        }

        let registry = Self {
            types: registered,
            query_type: query_type.to_string(),
            mutation_type: mutation_type.map(String::from),
        };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for def in self.types.values() {
            let TypeKind::Object(fields) = &def.kind else {
                continue;
            };
            if fields.is_empty() {
                return Err(SchemaError::EmptyObject {
                    name: def.name.clone(),
                });
            }

            for field in fields.values() {
                let coordinate = format!("{}.{}", def.name, field.name);
                self.check_known(&field.ty, &coordinate)?;

                for arg in &field.arguments {
                    let arg_coordinate = format!("{}({}:)", coordinate, arg.name);
                    self.check_known(&arg.ty, &arg_coordinate)?;
                    if !self.is_scalar(arg.ty.base_name()) {
                        return Err(SchemaError::InvalidArgumentType {
                            coordinate: arg_coordinate,
                            type_ref: arg.ty.to_string(),
                        });
                    }
                }
            }
        }

        self.check_root("Query", &self.query_type)?;
        if let Some(mutation) = &self.mutation_type {
            self.check_root("Mutation", mutation)?;
        }
        Ok(())
    }

    fn check_known(&self, ty: &TypeRef, referenced_by: &str) -> Result<(), SchemaError> {
        if self.types.contains_key(ty.base_name()) {
            Ok(())
        } else {
            Err(SchemaError::UnknownType {
                type_name: ty.base_name().to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    fn check_root(&self, root: &'static str, name: &str) -> Result<(), SchemaError> {
        match self.types.get(name) {
            None => Err(SchemaError::MissingRootType {
                root,
                name: name.to_string(),
            }),
            Some(def) if !def.is_object() => Err(SchemaError::RootNotObject {
                root,
                name: name.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    pub fn type_of(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn field_of(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.type_of(type_name)?.fields()?.get(field_name)
    }

    /// The scalar behind `name`, if `name` is a scalar type
    pub fn scalar_of(&self, name: &str) -> Option<&ScalarType> {
        match &self.type_of(name)?.kind {
            TypeKind::Scalar(scalar) => Some(scalar),
            TypeKind::Object(_) => None,
        }
    }

    pub fn is_scalar(&self, name: &str) -> bool {
        self.scalar_of(name).is_some()
    }

    pub fn query_type(&self) -> &TypeDef {
        // Presence is checked in `new`
        &self.types[self.query_type.as_str()]
    }

    pub fn mutation_type(&self) -> Option<&TypeDef> {
        self.mutation_type
            .as_deref()
            .and_then(|name| self.types.get(name))
    }

    /// Iterate over all types in registration order, built-in scalars first
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }
}
