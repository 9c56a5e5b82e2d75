//! Selection trees: the already-parsed shape of a request
//!
//! A [`Document`] holds one or more [`Operation`]s, each a rooted tree of
//! [`SelectionNode`]s. Trees come from [`Document::parse`] or are built by
//! hand:
//!
//! ```rust,ignore
//! let op = Operation::query(vec![
//!     SelectionNode::field("post")
//!         .arg("id", InputValue::variable("id"))
//!         .select(vec![SelectionNode::field("id"), SelectionNode::field("title")]),
//! ]);
//! ```

use crate::core::error::ValidationError;
use crate::schema::TypeRef;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// An argument value as written in the request
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    List(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
    /// `$name`, substituted from the request variables
    Variable(String),
}

impl InputValue {
    pub fn variable(name: impl Into<String>) -> Self {
        InputValue::Variable(name.into())
    }

    /// Substitute variables and convert to JSON
    ///
    /// Returns `None` when the value is a variable that was not supplied, in
    /// which case the argument counts as absent. Unsupplied variables nested in
    /// lists or objects become null.
    pub fn substitute(&self, variables: &Map<String, Value>) -> Option<Value> {
        match self {
            InputValue::Variable(name) => variables.get(name).cloned(),
            other => Some(other.to_json(variables)),
        }
    }

    fn to_json(&self, variables: &Map<String, Value>) -> Value {
        match self {
            InputValue::Null => Value::Null,
            InputValue::Int(i) => Value::from(*i),
            InputValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            InputValue::String(s) | InputValue::Enum(s) => Value::String(s.clone()),
            InputValue::Boolean(b) => Value::Bool(*b),
            InputValue::List(items) => {
                Value::Array(items.iter().map(|v| v.to_json(variables)).collect())
            }
            InputValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json(variables)))
                    .collect(),
            ),
            InputValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
        }
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Int(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        InputValue::Int(value.into())
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Float(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Boolean(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::String(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::String(value)
    }
}

/// One requested field and its sub-selections
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionNode {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Vec<(String, InputValue)>,
    pub selections: Vec<SelectionNode>,
}

impl SelectionNode {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: Vec::new(),
            selections: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    pub fn select(mut self, selections: Vec<SelectionNode>) -> Self {
        self.selections.extend(selections);
        self
    }

    /// Key of this field in the response: the alias, else the field name
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// `$name: Type = default` in an operation header
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub selections: Vec<SelectionNode>,
}

impl Operation {
    pub fn query(selections: Vec<SelectionNode>) -> Self {
        Self {
            kind: OperationKind::Query,
            name: None,
            variable_definitions: Vec::new(),
            selections,
        }
    }

    pub fn mutation(selections: Vec<SelectionNode>) -> Self {
        Self {
            kind: OperationKind::Mutation,
            ..Self::query(selections)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn variable(mut self, definition: VariableDefinition) -> Self {
        self.variable_definitions.push(definition);
        self
    }

    /// Merge declared defaults into the supplied variables
    ///
    /// A non-null variable with no default that was not supplied (or supplied
    /// as null) is an operation-level error.
    pub fn coerce_variables(
        &self,
        supplied: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        let mut variables = supplied.clone();

        for definition in &self.variable_definitions {
            let provided = variables.get(&definition.name).is_some_and(|v| !v.is_null());
            if provided {
                continue;
            }
            if let Some(default) = &definition.default_value {
                if !variables.contains_key(&definition.name) {
                    variables.insert(definition.name.clone(), default.clone());
                }
                continue;
            }
            if !definition.ty.is_nullable() {
                return Err(ValidationError::MissingVariable {
                    name: definition.name.clone(),
                    expected: definition.ty.to_string(),
                });
            }
        }

        Ok(variables)
    }
}

/// A request's operations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub operations: Vec<Operation>,
}

impl Document {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Pick the operation to run
    ///
    /// Without a name the document must contain exactly one operation.
    pub fn operation(&self, name: Option<&str>) -> Result<&Operation, ValidationError> {
        match name {
            Some(name) => self
                .operations
                .iter()
                .find(|op| op.name.as_deref() == Some(name))
                .ok_or_else(|| ValidationError::UnknownOperation {
                    name: name.to_string(),
                }),
            None => match self.operations.as_slice() {
                [] => Err(ValidationError::NoOperation),
                [only] => Ok(only),
                _ => Err(ValidationError::AmbiguousOperation),
            },
        }
    }
}

impl From<Operation> for Document {
    fn from(operation: Operation) -> Self {
        Self::new(vec![operation])
    }
}
