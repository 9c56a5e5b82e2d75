//! Query execution: selection trees in, response envelopes out

pub mod document;
pub mod engine;
pub(crate) mod executor;
pub mod invoker;
pub mod response;
pub mod selection;

pub use engine::{Executor, Request};
pub use invoker::PendingValue;
pub use response::{GraphQLError, PathSegment, ResponseEnvelope, ResponsePath, assemble};
pub use selection::{
    Document, InputValue, Operation, OperationKind, SelectionNode, VariableDefinition,
};
