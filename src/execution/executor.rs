//! Selection executor: walks a selection tree against the schema
//!
//! Every field is resolved, then completed against its declared type:
//! lists element by element, objects by recursing into the child selections,
//! scalars by serializing the leaf. Siblings and list elements are polled
//! concurrently and their results put back in selection order.
//!
//! Null propagation is an explicit post-order merge. A position that must
//! become null because of a non-null violation below it completes as
//! `Err(Propagate)`; the nearest nullable position turns that into `null`.
//! Each branch carries its own error list, concatenated in selection order
//! on the way up, so the final `errors` list does not depend on which
//! resolver finished first.

use super::invoker::{coerce_arguments, invoke};
use super::response::{GraphQLError, ResponsePath};
use super::selection::SelectionNode;
use crate::core::context::RequestContext;
use crate::core::error::{ExecutionError, ResolverError, ValidationError};
use crate::schema::{FieldDef, ResolverCall, ScalarType, Schema, TypeDef, TypeKind, TypeRef};
use futures::future::{BoxFuture, FutureExt, join_all};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A null reached a non-null position; the enclosing nullable position becomes null
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Propagate;

/// Result of completing one position plus the errors raised beneath it
type Completed<T> = (Result<T, Propagate>, Vec<GraphQLError>);

/// Executes the selections of one operation
pub(crate) struct SelectionExecutor<'a> {
    schema: &'a Schema,
    context: Arc<RequestContext>,
    variables: &'a Map<String, Value>,
}

impl<'a> SelectionExecutor<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        context: Arc<RequestContext>,
        variables: &'a Map<String, Value>,
    ) -> Self {
        Self {
            schema,
            context,
            variables,
        }
    }

    /// Execute the root selections
    ///
    /// Returns `None` for the data when null propagation reached the root.
    /// With `serial` set, root fields run one after another in request order.
    pub(crate) async fn execute_root(
        &self,
        root_type: &'a TypeDef,
        root_value: Value,
        selections: &'a [SelectionNode],
        serial: bool,
    ) -> (Option<Map<String, Value>>, Vec<GraphQLError>) {
        let (data, errors) = self
            .execute_selections(
                root_type,
                Arc::new(root_value),
                selections,
                ResponsePath::root(),
                serial,
            )
            .await;
        (data.ok(), errors)
    }

    fn execute_selections<'s>(
        &'s self,
        parent_type: &'a TypeDef,
        parent: Arc<Value>,
        selections: &'a [SelectionNode],
        path: ResponsePath,
        serial: bool,
    ) -> BoxFuture<'s, Completed<Map<String, Value>>> {
        async move {
            let fields = selections.iter().map(|node| {
                self.execute_field(
                    parent_type,
                    parent.clone(),
                    node,
                    path.join(node.response_key()),
                )
            });

            let results = if serial {
                let mut results = Vec::with_capacity(selections.len());
                for field in fields {
                    results.push(field.await);
                }
                results
            } else {
                join_all(fields).await
            };

            let mut data = Ok(Map::new());
            let mut errors = Vec::new();
            for (node, (value, field_errors)) in selections.iter().zip(results) {
                errors.extend(field_errors);
                match value {
                    Ok(value) => {
                        if let Ok(map) = &mut data {
                            map.insert(node.response_key().to_string(), value);
                        }
                    }
                    Err(Propagate) => data = Err(Propagate),
                }
            }
            (data, errors)
        }
        .boxed()
    }

    fn execute_field<'s>(
        &'s self,
        parent_type: &'a TypeDef,
        parent: Arc<Value>,
        node: &'a SelectionNode,
        path: ResponsePath,
    ) -> BoxFuture<'s, Completed<Value>> {
        async move {
            let Some(field) = parent_type
                .fields()
                .and_then(|fields| fields.get(&node.name))
            else {
                let error = ValidationError::UnknownField {
                    type_name: parent_type.name.clone(),
                    field_name: node.name.clone(),
                };
                return (Ok(Value::Null), vec![field_error(error, path)]);
            };

            if let Err(error) = self.check_selection_shape(field, node) {
                return (Ok(Value::Null), vec![field_error(error, path)]);
            }

            let registry = self.schema.registry();
            let args = match coerce_arguments(
                &parent_type.name,
                field,
                &node.arguments,
                self.variables,
                registry,
            ) {
                Ok(args) => args,
                Err(error) => return failed_position(field, field_error(error, path)),
            };

            let resolver = self.schema.resolver_for(&parent_type.name, &field.name);
            let call = ResolverCall {
                parent,
                args,
                context: self.context.clone(),
                type_name: parent_type.name.clone(),
                field_name: field.name.clone(),
            };

            let value = match invoke(&resolver, call).await {
                Ok(value) => value,
                Err(error) => return failed_position(field, field_error(error, path)),
            };

            let coordinate = format!("{}.{}", parent_type.name, field.name);
            self.complete_value(&field.ty, value, node, path, &coordinate)
                .await
        }
        .boxed()
    }

    /// Object fields need a sub-selection, scalar fields must not have one
    fn check_selection_shape(
        &self,
        field: &FieldDef,
        node: &SelectionNode,
    ) -> Result<(), ValidationError> {
        let is_object = self
            .schema
            .type_of(field.ty.base_name())
            .is_some_and(TypeDef::is_object);

        if is_object && node.selections.is_empty() {
            return Err(ValidationError::MissingSelection {
                field_name: node.name.clone(),
                type_ref: field.ty.to_string(),
            });
        }
        if !is_object && !node.selections.is_empty() {
            return Err(ValidationError::UnexpectedSelection {
                field_name: node.name.clone(),
                type_ref: field.ty.to_string(),
            });
        }
        Ok(())
    }

    /// Complete a value at any position, catching propagation at nullable ones
    fn complete_value<'s>(
        &'s self,
        ty: &'a TypeRef,
        value: Value,
        node: &'a SelectionNode,
        path: ResponsePath,
        coordinate: &'s str,
    ) -> BoxFuture<'s, Completed<Value>> {
        async move {
            match ty {
                TypeRef::NonNull(inner) => {
                    let (result, mut errors) = self
                        .complete_nullable(inner, value, node, path.clone(), coordinate)
                        .await;
                    match result {
                        Ok(Value::Null) => {
                            let violation = ResolverError::NonNullViolation {
                                coordinate: coordinate.to_string(),
                            };
                            errors.push(field_error(violation, path));
                            (Err(Propagate), errors)
                        }
                        other => (other, errors),
                    }
                }
                _ => {
                    let (result, errors) = self
                        .complete_nullable(ty, value, node, path, coordinate)
                        .await;
                    (Ok(result.unwrap_or(Value::Null)), errors)
                }
            }
        }
        .boxed()
    }

    /// Complete a value at a list or named type without catching propagation
    async fn complete_nullable(
        &self,
        ty: &'a TypeRef,
        value: Value,
        node: &'a SelectionNode,
        path: ResponsePath,
        coordinate: &str,
    ) -> Completed<Value> {
        if value.is_null() {
            return (Ok(Value::Null), Vec::new());
        }

        match ty {
            TypeRef::List(item_type) => {
                let Value::Array(items) = value else {
                    let error = ResolverError::NotAList {
                        coordinate: coordinate.to_string(),
                    };
                    return (Err(Propagate), vec![field_error(error, path)]);
                };

                let completions = items.into_iter().enumerate().map(|(index, item)| {
                    self.complete_value(item_type, item, node, path.join(index), coordinate)
                });

                let mut list = Ok(Vec::new());
                let mut errors = Vec::new();
                for (result, item_errors) in join_all(completions).await {
                    errors.extend(item_errors);
                    match result {
                        Ok(value) => {
                            if let Ok(values) = &mut list {
                                values.push(value);
                            }
                        }
                        Err(Propagate) => list = Err(Propagate),
                    }
                }
                (list.map(Value::Array), errors)
            }
            TypeRef::Named(name) => match self.schema.type_of(name).map(|def| (def, &def.kind)) {
                Some((def, TypeKind::Object(_))) => {
                    if !value.is_object() {
                        let error = ResolverError::NotAnObject {
                            coordinate: coordinate.to_string(),
                            type_name: def.name.clone(),
                        };
                        return (Err(Propagate), vec![field_error(error, path)]);
                    }
                    let (result, errors) = self
                        .execute_selections(def, Arc::new(value), &node.selections, path, false)
                        .await;
                    (result.map(Value::Object), errors)
                }
                Some((_, TypeKind::Scalar(scalar))) => match serialize_scalar(scalar, value) {
                    Ok(value) => (Ok(value), Vec::new()),
                    Err(error) => (Err(Propagate), vec![field_error(error, path)]),
                },
                // Unreachable once the registry validated every reference
                None => (Ok(Value::Null), Vec::new()),
            },
            TypeRef::NonNull(inner) => {
                self.complete_value(inner, value, node, path, coordinate)
                    .await
            }
        }
    }
}

/// Result of a field whose resolution failed: null, or propagation for non-null fields
fn failed_position(field: &FieldDef, error: GraphQLError) -> Completed<Value> {
    if field.is_nullable() {
        (Ok(Value::Null), vec![error])
    } else {
        (Err(Propagate), vec![error])
    }
}

fn field_error(error: impl Into<ExecutionError>, path: ResponsePath) -> GraphQLError {
    GraphQLError::at(&error.into(), path)
}

/// Serialize a leaf value as its declared scalar
pub(crate) fn serialize_scalar(scalar: &ScalarType, value: Value) -> Result<Value, ResolverError> {
    let serialized = match (scalar, &value) {
        (ScalarType::Int, Value::Bool(b)) => Some(Value::from(i32::from(*b))),
        (ScalarType::Int, Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::from),
        (ScalarType::Int, Value::String(s)) => s.trim().parse::<i32>().ok().map(Value::from),
        (ScalarType::Float, Value::Number(_)) => Some(value.clone()),
        (ScalarType::String, Value::String(_)) => Some(value.clone()),
        (ScalarType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ScalarType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (ScalarType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ScalarType::Id, Value::String(_)) => Some(value.clone()),
        (ScalarType::Id, Value::Number(n)) => n.as_i64().map(|i| Value::String(i.to_string())),
        (ScalarType::Custom(_), _) => Some(value.clone()),
        _ => None,
    };

    serialized.ok_or_else(|| ResolverError::InvalidScalar {
        scalar: scalar.name().to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolver;
    use serde_json::json;

    const SDL: &str = r#"
        type Post { id: Int! title: String tags: [String!] }
        type Query {
          post: Post
          strictPost: Post!
          posts: [Post]
          version: String
        }
    "#;

    async fn run(schema: Schema, selections: Vec<SelectionNode>) -> (Option<Value>, Vec<GraphQLError>) {
        let variables = Map::new();
        let executor = SelectionExecutor::new(&schema, Arc::new(RequestContext::new()), &variables);
        let (data, errors) = executor
            .execute_root(schema.registry().query_type(), Value::Null, &selections, false)
            .await;
        (data.map(Value::Object), errors)
    }

    fn post_selection(name: &str) -> SelectionNode {
        SelectionNode::field(name).select(vec![SelectionNode::field("id"), SelectionNode::field("title")])
    }

    #[test]
    fn test_serialize_scalars() {
        assert_eq!(serialize_scalar(&ScalarType::Int, json!(true)).unwrap(), json!(1));
        assert_eq!(serialize_scalar(&ScalarType::Int, json!(4.0)).unwrap(), json!(4));
        assert_eq!(serialize_scalar(&ScalarType::Int, json!("12")).unwrap(), json!(12));
        assert!(serialize_scalar(&ScalarType::Int, json!(4.5)).is_err());
        assert!(serialize_scalar(&ScalarType::Int, json!(1i64 << 40)).is_err());
        assert_eq!(serialize_scalar(&ScalarType::String, json!(7)).unwrap(), json!("7"));
        assert_eq!(serialize_scalar(&ScalarType::Id, json!(7)).unwrap(), json!("7"));
        assert!(serialize_scalar(&ScalarType::Boolean, json!("yes")).is_err());
        assert_eq!(
            serialize_scalar(&ScalarType::Custom("Json".into()), json!({"a": 1})).unwrap(),
            json!({"a": 1})
        );
    }

    #[tokio::test]
    async fn test_non_null_child_nulls_nearest_nullable_parent() {
        let schema = Schema::builder()
            .sdl(SDL)
            .resolver("Query", "post", resolver::constant(json!({"id": null, "title": "t"})))
            .resolver("Query", "version", resolver::constant(json!("1.0")))
            .build()
            .unwrap();

        let (data, errors) = run(
            schema,
            vec![post_selection("post"), SelectionNode::field("version")],
        )
        .await;

        assert_eq!(data, Some(json!({"post": null, "version": "1.0"})));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.as_ref().unwrap().to_string(), "post.id");
        assert_eq!(errors[0].message, "Cannot return null for non-nullable field Post.id.");
    }

    #[tokio::test]
    async fn test_propagation_through_non_null_root_field_nulls_data() {
        let schema = Schema::builder()
            .sdl(SDL)
            .resolver("Query", "strictPost", resolver::constant(json!({"title": "t"})))
            .build()
            .unwrap();

        let (data, errors) = run(schema, vec![post_selection("strictPost")]).await;

        assert_eq!(data, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.as_ref().unwrap().to_string(), "strictPost.id");
    }

    #[tokio::test]
    async fn test_list_elements_fail_independently() {
        let schema = Schema::builder()
            .sdl(SDL)
            .resolver(
                "Query",
                "posts",
                resolver::constant(json!([
                    {"id": 1, "title": "a"},
                    {"id": null},
                    {"id": 3, "tags": ["x", null]}
                ])),
            )
            .build()
            .unwrap();

        let posts = SelectionNode::field("posts").select(vec![
            SelectionNode::field("id"),
            SelectionNode::field("tags"),
        ]);
        let (data, errors) = run(schema, vec![posts]).await;

        assert_eq!(
            data,
            Some(json!({"posts": [
                {"id": 1, "tags": null},
                null,
                {"id": 3, "tags": null}
            ]}))
        );
        let paths: Vec<String> = errors
            .iter()
            .map(|e| e.path.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(paths, vec!["posts[1].id", "posts[2].tags[1]"]);
    }

    #[tokio::test]
    async fn test_non_list_value_for_list_field() {
        let schema = Schema::builder()
            .sdl(SDL)
            .resolver("Query", "posts", resolver::constant(json!({"id": 1})))
            .build()
            .unwrap();

        let (data, errors) = run(schema, vec![SelectionNode::field("posts").select(vec![SelectionNode::field("id")])]).await;

        assert_eq!(data, Some(json!({"posts": null})));
        assert_eq!(errors[0].code(), Some("RESOLVER_ERROR"));
    }

    #[tokio::test]
    async fn test_non_object_value_for_object_field() {
        let schema = || {
            Schema::builder()
                .sdl(SDL)
                .resolver("Query", "post", resolver::constant(json!(42)))
                .resolver("Query", "strictPost", resolver::constant(json!(["a"])))
                .resolver("Query", "version", resolver::constant(json!("1.0")))
                .build()
                .unwrap()
        };

        let (data, errors) = run(
            schema(),
            vec![post_selection("post"), SelectionNode::field("version")],
        )
        .await;

        assert_eq!(data, Some(json!({"post": null, "version": "1.0"})));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.as_ref().unwrap().to_string(), "post");
        assert_eq!(errors[0].code(), Some("RESOLVER_ERROR"));
        assert_eq!(
            errors[0].message,
            "Expected value of type \"Post\" for field \"Query.post\", found a non-object."
        );

        let (data, errors) = run(schema(), vec![post_selection("strictPost")]).await;
        assert_eq!(data, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.as_ref().unwrap().to_string(), "strictPost");
    }

    #[tokio::test]
    async fn test_null_list_stays_null() {
        let schema = Schema::builder()
            .sdl("type Query { tags: [String] }")
            .resolver("Query", "tags", resolver::constant(Value::Null))
            .build()
            .unwrap();

        let (data, errors) = run(schema, vec![SelectionNode::field("tags")]).await;

        assert_eq!(data, Some(json!({"tags": null})));
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_selection_shape_errors_skip_the_resolver() {
        let schema = Schema::builder()
            .sdl(SDL)
            .resolver(
                "Query",
                "post",
                resolver::from_fn(|_| panic!("must not be called")),
            )
            .build()
            .unwrap();

        let (data, errors) = run(
            schema,
            vec![
                SelectionNode::field("post"),
                SelectionNode::field("version").select(vec![SelectionNode::field("major")]),
            ],
        )
        .await;

        assert_eq!(data, Some(json!({"post": null, "version": null})));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code() == Some("GRAPHQL_VALIDATION_FAILED")));
    }
}
