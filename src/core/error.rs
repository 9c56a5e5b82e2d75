//! Typed error handling for the execution engine
//!
//! Every failure the engine can report falls into one of four categories:
//!
//! - [`SchemaError`]: the schema is inconsistent and must not be served
//! - [`ValidationError`]: the request references something the schema does not
//!   allow (unknown field, malformed argument, missing operation, ...)
//! - [`ResolverError`]: a resolver failed or returned a value that does not fit
//!   its declared type
//! - [`TimeoutError`]: the request exceeded its deadline or was cancelled
//!
//! Only `SchemaError` (at construction time) and `TimeoutError` (for the whole
//! request) terminate processing. Everything else is localized to a response
//! path and collected into the `errors` list of the envelope.
//!
//! # Example
//!
//! ```rust,ignore
//! match Schema::builder().sdl(SDL).build() {
//!     Ok(schema) => serve(schema),
//!     Err(SchemaError::UnknownType { type_name, referenced_by }) => {
//!         eprintln!("{} references undefined type {}", referenced_by, type_name);
//!     }
//!     Err(e) => eprintln!("invalid schema: {}", e),
//! }
//! ```

use std::fmt;

/// The main error type of the engine
#[derive(Debug)]
pub enum ExecutionError {
    /// Schema construction errors
    Schema(SchemaError),

    /// Request validation errors
    Validation(ValidationError),

    /// Resolver failures
    Resolver(ResolverError),

    /// Whole-request deadline or cancellation
    Timeout(TimeoutError),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Schema(e) => write!(f, "{}", e),
            ExecutionError::Validation(e) => write!(f, "{}", e),
            ExecutionError::Resolver(e) => write!(f, "{}", e),
            ExecutionError::Timeout(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionError::Schema(e) => Some(e),
            ExecutionError::Validation(e) => Some(e),
            ExecutionError::Resolver(e) => Some(e),
            ExecutionError::Timeout(e) => Some(e),
        }
    }
}

impl ExecutionError {
    /// Get the error code reported in `extensions.code`
    pub fn error_code(&self) -> &'static str {
        match self {
            ExecutionError::Schema(_) => "SCHEMA_ERROR",
            ExecutionError::Validation(_) => "GRAPHQL_VALIDATION_FAILED",
            ExecutionError::Resolver(_) => "RESOLVER_ERROR",
            ExecutionError::Timeout(_) => "REQUEST_TIMEOUT",
        }
    }

    /// Whether this error aborts the whole request rather than a single field
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecutionError::Schema(_) | ExecutionError::Timeout(_))
    }
}

impl From<SchemaError> for ExecutionError {
    fn from(err: SchemaError) -> Self {
        ExecutionError::Schema(err)
    }
}

impl From<ValidationError> for ExecutionError {
    fn from(err: ValidationError) -> Self {
        ExecutionError::Validation(err)
    }
}

impl From<ResolverError> for ExecutionError {
    fn from(err: ResolverError) -> Self {
        ExecutionError::Resolver(err)
    }
}

impl From<TimeoutError> for ExecutionError {
    fn from(err: TimeoutError) -> Self {
        ExecutionError::Timeout(err)
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while building a schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Type \"{name}\" is defined more than once")]
    DuplicateType { name: String },

    #[error("Field \"{type_name}.{field_name}\" is defined more than once")]
    DuplicateField {
        type_name: String,
        field_name: String,
    },

    #[error("Unknown type \"{type_name}\" referenced by {referenced_by}")]
    UnknownType {
        type_name: String,
        referenced_by: String,
    },

    #[error("{root} root type \"{name}\" is not defined")]
    MissingRootType { root: &'static str, name: String },

    #[error("{root} root type \"{name}\" must be an object type")]
    RootNotObject { root: &'static str, name: String },

    #[error("Object type \"{name}\" must define at least one field")]
    EmptyObject { name: String },

    #[error("Argument {coordinate} must be a scalar or a list of scalars, found \"{type_ref}\"")]
    InvalidArgumentType { coordinate: String, type_ref: String },

    #[error("Invalid type reference \"{input}\": {message}")]
    InvalidTypeReference { input: String, message: String },

    #[error("Resolver for {type_name}.{field_name} is registered more than once")]
    DuplicateResolver {
        type_name: String,
        field_name: String,
    },

    #[error("{type_name}.{field_name} defined in resolvers, but not in schema")]
    UnknownResolverTarget {
        type_name: String,
        field_name: String,
    },

    #[error("Unsupported schema definition: {message}")]
    Unsupported { message: String },

    #[error("Failed to parse schema definition: {message}")]
    Syntax { message: String },
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors caused by a request that does not fit the schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Cannot query field \"{field_name}\" on type \"{type_name}\".")]
    UnknownField {
        type_name: String,
        field_name: String,
    },

    #[error("Unknown argument \"{argument}\" on field \"{coordinate}\".")]
    UnknownArgument { coordinate: String, argument: String },

    #[error("Argument \"{argument}\" of required type \"{expected}\" was not provided.")]
    MissingArgument { argument: String, expected: String },

    #[error("Argument \"{argument}\" has invalid value: {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("Field \"{field_name}\" of type \"{type_ref}\" must have a selection of subfields.")]
    MissingSelection {
        field_name: String,
        type_ref: String,
    },

    #[error("Field \"{field_name}\" must not have a selection since type \"{type_ref}\" has no subfields.")]
    UnexpectedSelection {
        field_name: String,
        type_ref: String,
    },

    #[error("Variable \"${name}\" of required type \"{expected}\" was not provided.")]
    MissingVariable { name: String, expected: String },

    #[error("Fields \"{response_key}\" conflict because they select different fields or arguments.")]
    FieldConflict { response_key: String },

    #[error("Unknown fragment \"{name}\".")]
    UnknownFragment { name: String },

    #[error("Cannot spread fragment \"{name}\" within itself.")]
    FragmentCycle { name: String },

    #[error("Must provide an operation.")]
    NoOperation,

    #[error("Unknown operation named \"{name}\".")]
    UnknownOperation { name: String },

    #[error("Must provide operation name if query contains multiple operations.")]
    AmbiguousOperation,

    #[error("{kind} operations are not supported")]
    UnsupportedOperation { kind: String },

    #[error("Schema is not configured for mutations.")]
    MutationsNotSupported,

    #[error("Syntax Error: {message}")]
    Syntax { message: String },

    #[error("Invalid request body: {message}")]
    InvalidRequest { message: String },
}

// =============================================================================
// Resolver Errors
// =============================================================================

/// Errors raised by, or about the output of, a field resolver
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The resolver returned an error
    #[error("{source}")]
    Failed {
        coordinate: String,
        #[source]
        source: anyhow::Error,
    },

    /// The resolver panicked
    #[error("Resolver for {coordinate} panicked: {message}")]
    Panicked { coordinate: String, message: String },

    /// A non-nullable position resolved to null
    #[error("Cannot return null for non-nullable field {coordinate}.")]
    NonNullViolation { coordinate: String },

    /// A list-typed field resolved to something that is not a sequence
    #[error("Expected Iterable, but did not find one for field \"{coordinate}\".")]
    NotAList { coordinate: String },

    /// An object-typed field resolved to something that is not an object
    #[error("Expected value of type \"{type_name}\" for field \"{coordinate}\", found a non-object.")]
    NotAnObject {
        coordinate: String,
        type_name: String,
    },

    /// A scalar value cannot be represented by its declared scalar type
    #[error("{scalar} cannot represent value: {value}")]
    InvalidScalar { scalar: String, value: String },
}

// =============================================================================
// Timeout Errors
// =============================================================================

/// Whole-request termination
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeoutError {
    #[error("Request timed out after {after_ms}ms")]
    Elapsed { after_ms: u64 },

    #[error("Request was cancelled")]
    Cancelled,
}
