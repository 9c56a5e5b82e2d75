//! Blog schema against a local JSONPlaceholder stand-in
#![cfg(feature = "rest")]

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    routing::get,
};
use fieldwise::prelude::*;
use fieldwise::rest::{RestClient, blog_schema};
use tokio::net::TcpListener;

// =============================================================================
// Fake Backend
// =============================================================================

fn all_posts() -> Vec<Value> {
    vec![
        json!({"id": 1, "userId": 9, "title": "Hello", "body": "First post"}),
        json!({"id": 2, "userId": 9, "title": "Again", "body": "Second post"}),
    ]
}

async fn post_by_id(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    all_posts()
        .into_iter()
        .find(|p| p["id"] == json!(id))
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn user_by_id(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    if id == 9 {
        Ok(Json(json!({"id": 9, "username": "ana", "email": "ana@example.com"})))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn user_posts(Path(id): Path<i64>) -> Json<Value> {
    Json(Value::Array(
        all_posts()
            .into_iter()
            .filter(|p| p["userId"] == json!(id))
            .collect(),
    ))
}

async fn create_post(Json(_input): Json<Value>) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({"id": 101})))
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route(
            "/posts",
            get(|| async { Json(Value::Array(all_posts())) }).post(create_post),
        )
        .route("/posts/{id}", get(post_by_id))
        .route("/users/{id}", get(user_by_id))
        .route("/users/{id}/posts", get(user_posts));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn blog_executor() -> Executor {
    let schema = blog_schema(RestClient::new(spawn_backend().await)).unwrap();
    Executor::new(Arc::new(schema), ExecutorConfig::default())
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_post_with_author() {
    let executor = blog_executor().await;

    let response = executor
        .execute_query(
            "{ post(id: 1) { id title author { id username posts { id } } } }",
            Map::new(),
        )
        .await;

    assert_eq!(
        response.to_json(),
        json!({"data": {"post": {
            "id": 1,
            "title": "Hello",
            "author": {"id": 9, "username": "ana", "posts": [{"id": 1}, {"id": 2}]}
        }}})
    );
}

#[tokio::test]
async fn test_backend_404_is_field_error() {
    let executor = blog_executor().await;

    let response = executor
        .execute_query("{ post(id: 999) { id } posts { id } }", Map::new())
        .await;

    assert_eq!(
        response.data,
        Some(json!({"post": null, "posts": [{"id": 1}, {"id": 2}]}))
    );
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("404"));
}

#[tokio::test]
async fn test_add_post_merges_id_into_input() {
    let executor = blog_executor().await;

    let response = executor
        .execute_query(
            r#"mutation { addPost(title: "New", body: "Text", userId: 9) { id title body author { username } } }"#,
            Map::new(),
        )
        .await;

    assert_eq!(
        response.to_json(),
        json!({"data": {"addPost": {
            "id": 101,
            "title": "New",
            "body": "Text",
            "author": {"username": "ana"}
        }}})
    );
}
