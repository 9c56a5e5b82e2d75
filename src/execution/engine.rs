//! Request execution entry point

use super::executor::SelectionExecutor;
use super::response::{ResponseEnvelope, assemble};
use super::selection::{Document, Operation, OperationKind};
use crate::config::{ExecutorConfig, MutationPolicy};
use crate::core::context::RequestContext;
use crate::core::error::{ExecutionError, TimeoutError, ValidationError};
use crate::schema::{Schema, TypeDef};
use serde_json::{Map, Value};
use std::future::{self, Future};
use std::sync::Arc;

/// One request: a document plus everything needed to run one of its operations
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub document: Document,
    pub variables: Map<String, Value>,
    pub operation_name: Option<String>,
    /// Parent value handed to root field resolvers
    pub root_value: Value,
}

impl Request {
    pub fn new(document: impl Into<Document>) -> Self {
        Self {
            document: document.into(),
            ..Default::default()
        }
    }

    /// Parse query text into a request
    pub fn parse(query: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(Document::parse(query)?))
    }

    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn root_value(mut self, value: Value) -> Self {
        self.root_value = value;
        self
    }
}

/// Runs requests against a schema
///
/// Cheap to share: wrap it in an `Arc` and hand it to every request handler.
///
/// # Example
///
/// ```rust,ignore
/// let executor = Executor::new(Arc::new(schema), ExecutorConfig::default());
/// let response = executor
///     .execute(Request::parse("{ post(id: 1) { title } }")?, RequestContext::new())
///     .await;
/// println!("{}", response.to_json());
/// ```
pub struct Executor {
    schema: Arc<Schema>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(schema: Arc<Schema>, config: ExecutorConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a request
    ///
    /// Never fails: every problem ends up in the envelope's `errors`.
    pub async fn execute(&self, request: Request, context: RequestContext) -> ResponseEnvelope {
        self.execute_with_cancel(request, context, future::pending::<()>())
            .await
    }

    /// Parse and execute query text with a fresh context
    pub async fn execute_query(&self, query: &str, variables: Map<String, Value>) -> ResponseEnvelope {
        match Request::parse(query) {
            Ok(request) => {
                self.execute(request.variables(variables), RequestContext::new())
                    .await
            }
            Err(e) => ResponseEnvelope::failed(&e.into()),
        }
    }

    /// Execute a request, abandoning it as soon as `cancel` completes
    ///
    /// Pending resolver work is dropped on cancellation and on timeout.
    pub async fn execute_with_cancel<F>(
        &self,
        request: Request,
        context: RequestContext,
        cancel: F,
    ) -> ResponseEnvelope
    where
        F: Future,
    {
        let request_id = context.request_id();
        let run = self.run(&request, context);

        let bounded = async {
            match self.config.timeout() {
                Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                    TimeoutError::Elapsed {
                        after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    }
                }),
                None => Ok(run.await),
            }
        };

        let outcome = tokio::select! {
            outcome = bounded => outcome,
            _ = cancel => Err(TimeoutError::Cancelled),
        };

        outcome.unwrap_or_else(|error| {
            tracing::warn!(request_id = %request_id, error = %error, "request abandoned");
            ResponseEnvelope::failed(&error.into())
        })
    }

    async fn run(&self, request: &Request, context: RequestContext) -> ResponseEnvelope {
        let request_id = context.request_id();
        let (operation, root_type, variables) = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(error) => {
                tracing::debug!(request_id = %request_id, error = %error, "request rejected");
                return ResponseEnvelope::failed(&error);
            }
        };

        tracing::debug!(
            request_id = %request_id,
            operation = operation.name.as_deref().unwrap_or("<anonymous>"),
            kind = %operation.kind,
            "executing operation"
        );

        let serial = operation.kind == OperationKind::Mutation
            && self.config.mutation_policy == MutationPolicy::Sequential;
        let executor = SelectionExecutor::new(&self.schema, Arc::new(context), &variables);
        let (data, errors) = executor
            .execute_root(
                root_type,
                request.root_value.clone(),
                &operation.selections,
                serial,
            )
            .await;

        tracing::debug!(
            request_id = %request_id,
            errors = errors.len(),
            data_null = data.is_none(),
            "operation finished"
        );

        assemble(data, errors)
    }

    /// Pick the operation, its root type and its coerced variables
    fn prepare<'r>(
        &'r self,
        request: &'r Request,
    ) -> Result<(&'r Operation, &'r TypeDef, Map<String, Value>), ExecutionError> {
        let operation = request
            .document
            .operation(request.operation_name.as_deref())?;

        let registry = self.schema.registry();
        let root_type = match operation.kind {
            OperationKind::Query => registry.query_type(),
            OperationKind::Mutation => registry
                .mutation_type()
                .ok_or(ValidationError::MutationsNotSupported)?,
        };

        let variables = operation.coerce_variables(&request.variables)?;
        Ok((operation, root_type, variables))
    }
}
