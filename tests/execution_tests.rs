//! End-to-end execution tests over an in-memory blog schema

use fieldwise::prelude::*;
use std::sync::Mutex;
use std::time::Duration;

// =============================================================================
// Test Schema
// =============================================================================

const SDL: &str = r#"
  type Post {
    id: Int!
    title: String
    body: String
    author: User
  }

  type User {
    id: Int!
    username: String
    email: String
    posts: [Post]
  }

  type Query {
    posts: [Post]
    post(id: Int!): Post
    users: [User]
    user(id: Int!): User
    strictPost(id: Int!): Post!
    slow: String
    fast: String
    panics: String
    requiresEditor: String
  }

  type Mutation {
    addPost(title: String!, body: String!, userId: Int!): Post!
  }
"#;

fn posts() -> Value {
    json!([
        {"id": 1, "title": "Hello", "body": "First post", "userId": 9},
        {"id": 2, "title": "Again", "body": "Second post", "userId": 9},
        {"id": 3, "title": null, "body": "Untitled", "userId": 4}
    ])
}

fn users() -> Value {
    json!([
        {"id": 9, "username": "ana", "email": "ana@example.com"},
        {"id": 4, "username": "bo", "email": "bo@example.com"}
    ])
}

fn find(collection: Value, id: i64) -> Option<Value> {
    collection
        .as_array()?
        .iter()
        .find(|item| item["id"] == json!(id))
        .cloned()
}

fn lookup_post(id: i64) -> Result<Value> {
    find(posts(), id).ok_or_else(|| anyhow::anyhow!("post {} not found", id))
}

fn builder() -> SchemaBuilder {
    Schema::builder()
        .sdl(SDL)
        .resolver("Query", "posts", resolver::constant(posts()))
        .resolver(
            "Query",
            "post",
            resolver::from_async_fn(|call| async move { lookup_post(call.args.i64("id")?) }),
        )
        .resolver("Query", "users", resolver::constant(users()))
        .resolver(
            "Query",
            "user",
            resolver::from_fn(|call| Ok(find(users(), call.args.i64("id")?).unwrap_or(Value::Null))),
        )
        .resolver(
            "Query",
            "strictPost",
            resolver::from_fn(|call| lookup_post(call.args.i64("id")?)),
        )
        .resolver(
            "Query",
            "slow",
            resolver::from_async_fn(|_| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                anyhow::Ok(json!("slow"))
            }),
        )
        .resolver("Query", "fast", resolver::constant(json!("fast")))
        .resolver("Query", "panics", resolver::from_fn(|_| panic!("resolver bug")))
        .resolver(
            "Query",
            "requiresEditor",
            resolver::from_fn(|call| {
                call.context
                    .authorize(&AuthPolicy::HasRole(vec!["editor".to_string()]))?;
                Ok(json!("secret"))
            }),
        )
        .resolver(
            "Post",
            "author",
            resolver::from_async_fn(|call| async move {
                let user_id = call.parent.get("userId").and_then(Value::as_i64);
                anyhow::Ok(user_id.and_then(|id| find(users(), id)).unwrap_or(Value::Null))
            }),
        )
        .resolver(
            "User",
            "posts",
            resolver::from_fn(|call| {
                let id = call.parent["id"].clone();
                let owned: Vec<Value> = posts()
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter(|p| p["userId"] == id)
                    .cloned()
                    .collect();
                Ok(Value::Array(owned))
            }),
        )
}

fn executor() -> Executor {
    Executor::new(
        Arc::new(builder().build().expect("schema builds")),
        ExecutorConfig::default(),
    )
}

async fn run(query: &str) -> Value {
    executor().execute_query(query, Map::new()).await.to_json()
}

// =============================================================================
// Basic Resolution
// =============================================================================

#[tokio::test]
async fn test_nested_object_resolution() {
    let response = run("{ post(id: 1) { id author { id username } } }").await;

    assert_eq!(
        response,
        json!({"data": {"post": {"id": 1, "author": {"id": 9, "username": "ana"}}}})
    );
}

#[tokio::test]
async fn test_keys_follow_selection_order() {
    let response = run("{ post(id: 1) { title id body } fast }").await;

    assert_eq!(
        response.to_string(),
        r#"{"data":{"post":{"title":"Hello","id":1,"body":"First post"},"fast":"fast"}}"#
    );
}

#[tokio::test]
async fn test_delayed_sibling_keeps_order() {
    let response = run("{ slow fast }").await;

    assert_eq!(response.to_string(), r#"{"data":{"slow":"slow","fast":"fast"}}"#);
}

#[tokio::test]
async fn test_lists_preserve_length_and_order() {
    let response = run("{ users { username posts { id } } }").await;

    assert_eq!(
        response,
        json!({"data": {"users": [
            {"username": "ana", "posts": [{"id": 1}, {"id": 2}]},
            {"username": "bo", "posts": [{"id": 3}]}
        ]}})
    );
}

#[tokio::test]
async fn test_aliases_key_the_response() {
    let response = run("{ first: post(id: 1) { title } second: post(id: 2) { title } }").await;

    assert_eq!(
        response,
        json!({"data": {"first": {"title": "Hello"}, "second": {"title": "Again"}}})
    );
}

#[tokio::test]
async fn test_fragments() {
    let response = run(
        "query { post(id: 3) { ...PostFields author { username } } } fragment PostFields on Post { id title }",
    )
    .await;

    assert_eq!(
        response,
        json!({"data": {"post": {"id": 3, "title": null, "author": {"username": "bo"}}}})
    );
}

// =============================================================================
// Variables and Arguments
// =============================================================================

#[tokio::test]
async fn test_variables_substitute() {
    let request = Request::parse("query Post($id: Int!) { post(id: $id) { id body title } }")
        .unwrap()
        .variable("id", 2i64)
        .operation_name("Post");

    let response = executor().execute(request, RequestContext::new()).await;

    assert!(response.is_ok());
    assert_eq!(
        response.data,
        Some(json!({"post": {"id": 2, "body": "Second post", "title": "Again"}}))
    );
}

#[tokio::test]
async fn test_missing_required_variable_fails_operation() {
    let response = run("query Post($id: Int!) { post(id: $id) { id } }").await;

    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"].as_array().unwrap().len(), 1);
    assert_eq!(
        response["errors"][0]["message"],
        "Variable \"$id\" of required type \"Int!\" was not provided."
    );
}

#[tokio::test]
async fn test_missing_required_argument_is_field_error() {
    let response = run("{ post { id } fast }").await;

    assert_eq!(response["data"], json!({"post": null, "fast": "fast"}));
    assert_eq!(response["errors"][0]["path"], json!(["post"]));
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        "GRAPHQL_VALIDATION_FAILED"
    );
}

#[tokio::test]
async fn test_invalid_argument_type() {
    let response = run(r#"{ post(id: "one") { id } }"#).await;

    assert_eq!(response["data"], json!({"post": null}));
    assert!(
        response["errors"][0]["message"]
            .as_str()
            .unwrap()
            .starts_with("Argument \"id\" has invalid value")
    );
}

// =============================================================================
// Errors and Null Propagation
// =============================================================================

#[tokio::test]
async fn test_nullable_field_failure() {
    let response = run("{ post(id: 999) { id } fast }").await;

    assert_eq!(response["data"], json!({"post": null, "fast": "fast"}));
    assert_eq!(
        response["errors"],
        json!([{
            "message": "post 999 not found",
            "path": ["post"],
            "extensions": {"code": "RESOLVER_ERROR"}
        }])
    );
}

#[tokio::test]
async fn test_non_null_root_failure_nulls_data() {
    let response = run("{ strictPost(id: 999) { id } fast }").await;

    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"].as_array().unwrap().len(), 1);
    assert_eq!(response["errors"][0]["path"], json!(["strictPost"]));
}

#[tokio::test]
async fn test_unknown_field_leaves_siblings() {
    let response = run("{ post(id: 1) { id slug } fast }").await;

    assert_eq!(
        response["data"],
        json!({"post": {"id": 1, "slug": null}, "fast": "fast"})
    );
    assert_eq!(response["errors"][0]["path"], json!(["post", "slug"]));
    assert_eq!(
        response["errors"][0]["message"],
        "Cannot query field \"slug\" on type \"Post\"."
    );
}

#[tokio::test]
async fn test_unknown_root_field() {
    let response = run("{ comments { id } fast }").await;

    assert_eq!(response["data"], json!({"comments": null, "fast": "fast"}));
    assert_eq!(response["errors"][0]["path"], json!(["comments"]));
}

#[tokio::test]
async fn test_panicking_resolver_is_contained() {
    let response = run("{ panics fast }").await;

    assert_eq!(response["data"], json!({"panics": null, "fast": "fast"}));
    assert_eq!(response["errors"][0]["extensions"]["code"], "RESOLVER_ERROR");
    assert_eq!(response["errors"][0]["path"], json!(["panics"]));
}

#[tokio::test]
async fn test_errors_are_ordered_by_selection() {
    let response = run("{ missing: post(id: 998) { id } absent: post(id: 999) { id } }").await;

    let paths: Vec<&Value> = response["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| &e["path"])
        .collect();
    assert_eq!(paths, vec![&json!(["missing"]), &json!(["absent"])]);
}

#[tokio::test]
async fn test_authorization_failure_is_field_error() {
    let executor = executor();
    let request = Request::parse("{ requiresEditor }").unwrap();

    let response = executor.execute(request.clone(), RequestContext::new()).await;
    assert_eq!(response.data, Some(json!({"requiresEditor": null})));
    assert_eq!(response.errors[0].message, "Not authorized to access this field");

    let editor = RequestContext::new().with_auth(AuthContext::User {
        user_id: "9".to_string(),
        roles: vec!["editor".to_string()],
    });
    let response = executor.execute(request, editor).await;
    assert_eq!(response.data, Some(json!({"requiresEditor": "secret"})));
}

// =============================================================================
// Operations
// =============================================================================

#[tokio::test]
async fn test_operation_selection() {
    let executor = executor();
    let query = "query A { fast } query B { post(id: 1) { id } }";

    let response = executor
        .execute(
            Request::parse(query).unwrap().operation_name("B"),
            RequestContext::new(),
        )
        .await;
    assert_eq!(response.data, Some(json!({"post": {"id": 1}})));

    let response = executor
        .execute(Request::parse(query).unwrap(), RequestContext::new())
        .await;
    assert_eq!(response.data, None);
    assert_eq!(
        response.errors[0].message,
        "Must provide operation name if query contains multiple operations."
    );

    let response = executor
        .execute(
            Request::parse(query).unwrap().operation_name("C"),
            RequestContext::new(),
        )
        .await;
    assert_eq!(response.errors[0].message, "Unknown operation named \"C\".");
}

#[tokio::test]
async fn test_programmatic_document() {
    let operation = Operation::query(vec![
        SelectionNode::field("post")
            .alias("hello")
            .arg("id", 1i64)
            .select(vec![SelectionNode::field("title")]),
    ]);

    let response = executor()
        .execute(Request::new(operation), RequestContext::new())
        .await;
    assert_eq!(response.data, Some(json!({"hello": {"title": "Hello"}})));
}

#[tokio::test]
async fn test_root_value_reaches_default_resolvers() {
    let schema = Schema::builder()
        .sdl("type Query { greeting: String }")
        .build()
        .unwrap();
    let executor = Executor::new(Arc::new(schema), ExecutorConfig::default());

    let response = executor
        .execute(
            Request::parse("{ greeting }")
                .unwrap()
                .root_value(json!({"greeting": "hi"})),
            RequestContext::new(),
        )
        .await;
    assert_eq!(response.data, Some(json!({"greeting": "hi"})));
}

// =============================================================================
// Mutations
// =============================================================================

fn recording_mutation_schema(log: Arc<Mutex<Vec<String>>>) -> Schema {
    let add_post = resolver::from_async_fn(move |call| {
        let log = log.clone();
        async move {
            let title = call.args.str("title")?.to_string();
            // Earlier mutations sleep longer so concurrent runs would finish out of order
            let delay = if title == "first" { 30 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            log.lock().unwrap().push(title.clone());
            let user_id = call.args.i64("userId")?;
            anyhow::Ok(json!({"id": 101, "title": title, "userId": user_id}))
        }
    });

    Schema::builder()
        .sdl(SDL)
        .resolver("Mutation", "addPost", add_post)
        .build()
        .unwrap()
}

const TWO_MUTATIONS: &str = r#"
  mutation {
    a: addPost(title: "first", body: "b", userId: 9) { id title }
    b: addPost(title: "second", body: "b", userId: 9) { id title }
  }
"#;

#[tokio::test]
async fn test_sequential_mutations_run_in_request_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let executor = Executor::new(
        Arc::new(recording_mutation_schema(log.clone())),
        ExecutorConfig::default(),
    );

    let response = executor.execute_query(TWO_MUTATIONS, Map::new()).await;

    assert!(response.is_ok());
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(
        response.data,
        Some(json!({"a": {"id": 101, "title": "first"}, "b": {"id": 101, "title": "second"}}))
    );
}

#[tokio::test]
async fn test_concurrent_mutation_policy() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let executor = Executor::new(
        Arc::new(recording_mutation_schema(log.clone())),
        ExecutorConfig::default().with_mutation_policy(MutationPolicy::Concurrent),
    );

    let response = executor.execute_query(TWO_MUTATIONS, Map::new()).await;

    assert!(response.is_ok());
    assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
    let keys: Vec<&String> = response.data.as_ref().unwrap().as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["a", "b"]);
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test]
async fn test_timeout_returns_single_error() {
    let executor = Executor::new(
        Arc::new(builder().build().unwrap()),
        ExecutorConfig::default().with_timeout(Duration::from_millis(10)),
    );

    let response = executor.execute_query("{ fast slow }", Map::new()).await;

    assert_eq!(
        response.to_json(),
        json!({
            "data": null,
            "errors": [{
                "message": "Request timed out after 10ms",
                "extensions": {"code": "REQUEST_TIMEOUT"}
            }]
        })
    );
}

// =============================================================================
// Schema Construction
// =============================================================================

#[test]
fn test_duplicate_resolver_fails_schema() {
    let result = builder()
        .resolver("Query", "fast", resolver::constant(json!("again")))
        .build();

    assert!(matches!(result, Err(SchemaError::DuplicateResolver { .. })));
}

#[test]
fn test_unknown_type_fails_schema() {
    let result = Schema::builder()
        .sdl("type Query { post: Post }")
        .build();

    assert_eq!(
        result.unwrap_err(),
        SchemaError::UnknownType {
            type_name: "Post".to_string(),
            referenced_by: "Query.post".to_string(),
        }
    );
}
