//! Field resolver invocation
//!
//! Two steps sit between a selection and its resolver: the written
//! arguments are substituted and coerced against the field's declarations,
//! then the resolver is called and its outcome, ready or deferred, is folded
//! into a single [`PendingValue`]. Resolver errors and panics both come out
//! of this module as [`ResolverError`]s.

use crate::core::error::{ExecutionError, ResolverError, ValidationError};
use crate::execution::selection::InputValue;
use crate::schema::{
    Arguments, FieldDef, Resolution, Resolver, ResolverCall, ScalarType, TypeRef, TypeRegistry,
};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Number, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The eventual value of one resolver call
pub type PendingValue = BoxFuture<'static, Result<Value, ExecutionError>>;

/// Substitute variables into the written arguments and coerce them
///
/// Arguments come out in declaration order. Declared defaults fill in for
/// absent arguments; an argument that is absent, has no default and is
/// nullable stays absent.
pub fn coerce_arguments(
    type_name: &str,
    field: &FieldDef,
    written: &[(String, InputValue)],
    variables: &Map<String, Value>,
    registry: &TypeRegistry,
) -> Result<Arguments, ValidationError> {
    if let Some((unknown, _)) = written
        .iter()
        .find(|(name, _)| field.argument_def(name).is_none())
    {
        return Err(ValidationError::UnknownArgument {
            coordinate: format!("{}.{}", type_name, field.name),
            argument: unknown.clone(),
        });
    }

    let mut coerced = Map::new();
    for def in &field.arguments {
        let supplied = written
            .iter()
            .find(|(name, _)| name == &def.name)
            .and_then(|(_, value)| value.substitute(variables));

        let Some(value) = supplied else {
            if let Some(default) = &def.default_value {
                coerced.insert(def.name.clone(), default.clone());
            } else if !def.ty.is_nullable() {
                return Err(ValidationError::MissingArgument {
                    argument: def.name.clone(),
                    expected: def.ty.to_string(),
                });
            }
            continue;
        };

        let value = coerce_input(value, &def.ty, registry).map_err(|message| {
            ValidationError::InvalidArgument {
                argument: def.name.clone(),
                message,
            }
        })?;
        coerced.insert(def.name.clone(), value);
    }

    Ok(Arguments::new(coerced))
}

fn coerce_input(value: Value, ty: &TypeRef, registry: &TypeRegistry) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{}\" not to be null.", ty));
            }
            coerce_input(value, inner, registry)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(item) => match value {
            Value::Array(items) => items
                .into_iter()
                .map(|v| coerce_input(v, item, registry))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => Ok(Value::Array(vec![coerce_input(single, item, registry)?])),
        },
        TypeRef::Named(name) => {
            let scalar = registry
                .scalar_of(name)
                .ok_or_else(|| format!("\"{}\" is not an input type", name))?;
            coerce_scalar_input(scalar, value)
        }
    }
}

fn coerce_scalar_input(scalar: &ScalarType, value: Value) -> Result<Value, String> {
    let ok = match (scalar, &value) {
        (ScalarType::Int, Value::Number(n)) => n
            .as_i64()
            .is_some_and(|i| i32::try_from(i).is_ok()),
        (ScalarType::Float, Value::Number(n)) => {
            if let Some(f) = n.as_f64().and_then(Number::from_f64) {
                return Ok(Value::Number(f));
            }
            false
        }
        (ScalarType::String, Value::String(_)) => true,
        (ScalarType::Boolean, Value::Bool(_)) => true,
        (ScalarType::Id, Value::String(_)) => true,
        (ScalarType::Id, Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::String(i.to_string()));
            }
            false
        }
        (ScalarType::Custom(_), _) => true,
        _ => false,
    };

    if ok {
        Ok(value)
    } else {
        Err(format!("{} cannot represent value: {}", scalar.name(), value))
    }
}

/// Call a resolver and normalize its outcome
///
/// Synchronous panics are caught around the call itself, asynchronous ones
/// around the returned future.
pub fn invoke(resolver: &Arc<dyn Resolver>, call: ResolverCall) -> PendingValue {
    let coordinate = format!("{}.{}", call.type_name, call.field_name);

    let resolution = match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(call))) {
        Ok(resolution) => resolution,
        Err(payload) => return future::ready(Err(panicked(coordinate, payload))).boxed(),
    };

    match resolution {
        Resolution::Ready(result) => {
            future::ready(result.map_err(|source| failed(coordinate, source))).boxed()
        }
        Resolution::Deferred(pending) => AssertUnwindSafe(pending)
            .catch_unwind()
            .map(move |outcome| match outcome {
                Ok(result) => result.map_err(|source| failed(coordinate, source)),
                Err(payload) => Err(panicked(coordinate, payload)),
            })
            .boxed(),
    }
}

fn failed(coordinate: String, source: anyhow::Error) -> ExecutionError {
    tracing::warn!(field = %coordinate, error = %source, "resolver failed");
    ResolverError::Failed { coordinate, source }.into()
}

fn panicked(coordinate: String, payload: Box<dyn Any + Send>) -> ExecutionError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    tracing::warn!(field = %coordinate, panic = %message, "resolver panicked");
    ResolverError::Panicked { coordinate, message }.into()
}
