//! GraphQL over HTTP
//!
//! `POST /graphql` accepts the usual `{ query, variables, operationName }`
//! body and always answers `200 OK` with the response envelope, failures
//! included. `GET /graphql/schema` returns the schema as SDL. CORS is open so
//! browser clients can call the endpoint directly.

use crate::core::auth::{AuthProvider, NoAuthProvider};
use crate::core::context::RequestContext;
use crate::core::error::ValidationError;
use crate::execution::{Executor, GraphQLError, Request, ResponseEnvelope};
use crate::schema::sdl::print_sdl;
use axum::{
    Router,
    extract::{Extension, Json, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Body of a GraphQL HTTP request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequestBody {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
    #[serde(default)]
    pub operation_name: Option<String>,
}

#[derive(Clone)]
struct GraphQLState {
    executor: Arc<Executor>,
    auth: Arc<dyn AuthProvider>,
}

/// GraphQL API exposure over axum
pub struct GraphQLExposure;

impl GraphQLExposure {
    /// Build the GraphQL router; every caller is anonymous
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let executor = Arc::new(Executor::new(Arc::new(schema), ExecutorConfig::default()));
    /// let app = GraphQLExposure::build_router(executor);
    /// axum::serve(listener, app).await?;
    /// ```
    pub fn build_router(executor: Arc<Executor>) -> Router {
        Self::build_router_with_auth(executor, Arc::new(NoAuthProvider))
    }

    /// Build the GraphQL router, extracting caller identity with `auth`
    pub fn build_router_with_auth(executor: Arc<Executor>, auth: Arc<dyn AuthProvider>) -> Router {
        Router::new()
            .route("/graphql", post(graphql_handler))
            .route("/graphql/schema", get(graphql_schema))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive())
                    .layer(Extension(GraphQLState { executor, auth })),
            )
    }
}

/// Handler for GraphQL queries and mutations
async fn graphql_handler(
    Extension(state): Extension<GraphQLState>,
    headers: HeaderMap,
    body: Result<Json<GraphQLRequestBody>, JsonRejection>,
) -> Json<ResponseEnvelope> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejected request body");
            let error = ValidationError::InvalidRequest {
                message: rejection.body_text(),
            };
            return Json(ResponseEnvelope::failed(&error.into()));
        }
    };

    let auth = match state.auth.extract_context(&headers).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(error = %e, "failed to extract auth context");
            return Json(unauthenticated(&e));
        }
    };

    let request = match Request::parse(&body.query) {
        Ok(request) => request,
        Err(e) => return Json(ResponseEnvelope::failed(&e.into())),
    };
    let mut request = request.variables(body.variables.unwrap_or_default());
    request.operation_name = body.operation_name;

    let context = RequestContext::new().with_auth(auth);
    Json(state.executor.execute(request, context).await)
}

/// Handler for the schema SDL export
async fn graphql_schema(Extension(state): Extension<GraphQLState>) -> impl IntoResponse {
    let sdl = print_sdl(state.executor.schema().registry());
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], sdl)
}

fn unauthenticated(error: &anyhow::Error) -> ResponseEnvelope {
    let mut extensions = Map::new();
    extensions.insert("code".to_string(), Value::from("UNAUTHENTICATED"));
    ResponseEnvelope {
        data: None,
        errors: vec![GraphQLError {
            message: format!("Invalid credentials: {}", error),
            path: None,
            extensions,
        }],
    }
}
