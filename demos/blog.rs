//! Blog GraphQL server
//!
//! Serves the blog schema over HTTP, backed by JSONPlaceholder (or the API
//! named by `BLOG_API_URL`).
//!
//! ```sh
//! cargo run --example blog --features rest
//! curl -s localhost:3000/graphql -H 'content-type: application/json' \
//!   -d '{"query":"query Post($id: Int!) { post(id: $id) { id title body } }","variables":{"id":1}}'
//! ```

use fieldwise::prelude::*;
use fieldwise::rest::{RestClient, blog_schema};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,fieldwise=debug")),
        )
        .init();

    let base_url =
        std::env::var("BLOG_API_URL").unwrap_or_else(|_| RestClient::JSONPLACEHOLDER.to_string());
    let schema = blog_schema(RestClient::new(base_url))?;

    let config = match std::env::var("FIELDWISE_CONFIG") {
        Ok(path) => ExecutorConfig::from_yaml_file(&path)?,
        Err(_) => ExecutorConfig::default().with_timeout(Duration::from_secs(10)),
    };
    let executor = Arc::new(Executor::new(Arc::new(schema), config));

    // Print one query before serving
    let response = executor
        .execute(
            Request::parse("query Post($id: Int!) { post(id: $id) { id title body } }")?
                .variable("id", 1i64),
            RequestContext::new(),
        )
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    let app = GraphQLExposure::build_router_with_auth(executor, Arc::new(HeaderAuthProvider));

    println!("\n🌐 GraphQL endpoint on http://127.0.0.1:3000/graphql");
    println!("📜 Schema SDL on http://127.0.0.1:3000/graphql/schema");

    fieldwise::server::serve(app, "127.0.0.1:3000").await
}
