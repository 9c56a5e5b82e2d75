//! Response envelope and field errors

use crate::core::error::ExecutionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One step of a response path: an object key or a list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a value in the response `data`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponsePath(Vec<PathSegment>);

impl ResponsePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path one segment deeper
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for ResponsePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// An entry of the `errors` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,

    /// Path of the failing field; absent for request-level errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<ResponsePath>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl GraphQLError {
    /// Error at a response path
    pub fn at(error: &ExecutionError, path: ResponsePath) -> Self {
        Self {
            path: Some(path),
            ..Self::request(error)
        }
    }

    /// Request-level error without a path
    pub fn request(error: &ExecutionError) -> Self {
        let mut extensions = Map::new();
        extensions.insert("code".to_string(), Value::from(error.error_code()));
        Self {
            message: error.to_string(),
            path: None,
            extensions,
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code").and_then(Value::as_str)
    }
}

/// The `{ data, errors }` envelope returned for every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Always serialized, `null` when the request failed as a whole
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl ResponseEnvelope {
    /// Envelope for a request that failed before or instead of producing data
    pub fn failed(error: &ExecutionError) -> Self {
        assemble(None, vec![GraphQLError::request(error)])
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Package executor output into the envelope
///
/// `data` is `None` when null propagation reached the root.
pub fn assemble(data: Option<Map<String, Value>>, errors: Vec<GraphQLError>) -> ResponseEnvelope {
    ResponseEnvelope {
        data: data.map(Value::Object),
        errors,
    }
}
