//! Lowering of parsed query text into selection trees
//!
//! Parsing is delegated to `graphql-parser`. Lowering flattens fragment
//! spreads and inline fragments into the enclosing selection list, merges
//! fields that share a response key and drops directives.

use super::selection::{
    Document, InputValue, Operation, OperationKind, SelectionNode, VariableDefinition,
};
use crate::core::error::ValidationError;
use crate::schema::sdl::{const_value_to_json, lower_type};
use graphql_parser::query::{
    self as ast, Definition, FragmentDefinition, OperationDefinition, Selection, parse_query,
};
use indexmap::IndexMap;
use std::collections::HashMap;

type Fragments<'d, 'a> = HashMap<&'d str, &'d FragmentDefinition<'a, String>>;

impl Document {
    /// Parse query text into a document
    pub fn parse(query: &str) -> Result<Self, ValidationError> {
        let parsed = parse_query::<String>(query).map_err(|e| ValidationError::Syntax {
            message: e.to_string(),
        })?;

        let fragments: Fragments<'_, '_> = parsed
            .definitions
            .iter()
            .filter_map(|def| match def {
                Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
                Definition::Operation(_) => None,
            })
            .collect();

        let mut operations = Vec::new();
        for def in &parsed.definitions {
            if let Definition::Operation(op) = def {
                operations.push(lower_operation(op, &fragments)?);
            }
        }

        Ok(Document::new(operations))
    }
}

fn lower_operation(
    op: &OperationDefinition<'_, String>,
    fragments: &Fragments<'_, '_>,
) -> Result<Operation, ValidationError> {
    let (kind, name, variables, selection_set) = match op {
        OperationDefinition::SelectionSet(set) => (OperationKind::Query, None, &[][..], set),
        OperationDefinition::Query(q) => (
            OperationKind::Query,
            q.name.clone(),
            q.variable_definitions.as_slice(),
            &q.selection_set,
        ),
        OperationDefinition::Mutation(m) => (
            OperationKind::Mutation,
            m.name.clone(),
            m.variable_definitions.as_slice(),
            &m.selection_set,
        ),
        OperationDefinition::Subscription(_) => {
            return Err(ValidationError::UnsupportedOperation {
                kind: "subscription".to_string(),
            });
        }
    };

    let mut variable_definitions = Vec::with_capacity(variables.len());
    for var in variables {
        let default_value = var
            .default_value
            .as_ref()
            .map(const_value_to_json)
            .transpose()
            .map_err(|message| ValidationError::InvalidArgument {
                argument: format!("${}", var.name),
                message,
            })?;
        variable_definitions.push(VariableDefinition {
            name: var.name.clone(),
            ty: lower_type(&var.var_type),
            default_value,
        });
    }

    let mut selections = Vec::new();
    lower_selection_set(
        &selection_set.items,
        fragments,
        &mut Vec::new(),
        &mut selections,
    )?;

    Ok(Operation {
        kind,
        name,
        variable_definitions,
        selections,
    })
}

fn lower_selection_set<'d>(
    items: &'d [Selection<'_, String>],
    fragments: &Fragments<'d, '_>,
    visiting: &mut Vec<&'d str>,
    out: &mut Vec<SelectionNode>,
) -> Result<(), ValidationError> {
    for item in items {
        match item {
            Selection::Field(field) => {
                if !field.directives.is_empty() {
                    tracing::debug!(field = %field.name, "ignoring field directives");
                }

                let mut node = SelectionNode::field(field.name.clone());
                node.alias = field.alias.clone();
                node.arguments = field
                    .arguments
                    .iter()
                    .map(|(name, value)| (name.clone(), lower_value(value)))
                    .collect();
                lower_selection_set(
                    &field.selection_set.items,
                    fragments,
                    visiting,
                    &mut node.selections,
                )?;
                merge_into(out, node)?;
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.fragment_name.as_str();
                let fragment = fragments.get(name).copied().ok_or_else(|| {
                    ValidationError::UnknownFragment {
                        name: name.to_string(),
                    }
                })?;
                if visiting.contains(&name) {
                    return Err(ValidationError::FragmentCycle {
                        name: name.to_string(),
                    });
                }

                visiting.push(fragment.name.as_str());
                lower_selection_set(&fragment.selection_set.items, fragments, visiting, out)?;
                visiting.pop();
            }
            Selection::InlineFragment(inline) => {
                lower_selection_set(&inline.selection_set.items, fragments, visiting, out)?;
            }
        }
    }
    Ok(())
}

/// Add `node` to `out`, merging it with an earlier field of the same response key
fn merge_into(out: &mut Vec<SelectionNode>, node: SelectionNode) -> Result<(), ValidationError> {
    let Some(existing) = out
        .iter_mut()
        .find(|n| n.response_key() == node.response_key())
    else {
        out.push(node);
        return Ok(());
    };

    if existing.name != node.name || !same_arguments(&existing.arguments, &node.arguments) {
        return Err(ValidationError::FieldConflict {
            response_key: node.response_key().to_string(),
        });
    }
    for child in node.selections {
        merge_into(&mut existing.selections, child)?;
    }
    Ok(())
}

/// Argument lists are equal regardless of the order they were written in
fn same_arguments(a: &[(String, InputValue)], b: &[(String, InputValue)]) -> bool {
    a.len() == b.len() && a.iter().all(|arg| b.contains(arg))
}

fn lower_value(value: &ast::Value<'_, String>) -> InputValue {
    match value {
        ast::Value::Variable(name) => InputValue::Variable(name.clone()),
        ast::Value::Int(i) => i.as_i64().map_or(InputValue::Null, InputValue::Int),
        ast::Value::Float(f) => InputValue::Float(*f),
        ast::Value::String(s) => InputValue::String(s.clone()),
        ast::Value::Boolean(b) => InputValue::Boolean(*b),
        ast::Value::Null => InputValue::Null,
        ast::Value::Enum(e) => InputValue::Enum(e.clone()),
        ast::Value::List(items) => InputValue::List(items.iter().map(lower_value).collect()),
        ast::Value::Object(fields) => InputValue::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), lower_value(v)))
                .collect::<IndexMap<_, _>>(),
        ),
    }
}
