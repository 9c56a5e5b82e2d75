//! Blog schema backed by a JSONPlaceholder-style REST API
//!
//! | field          | request                    |
//! |----------------|----------------------------|
//! | `Query.posts`  | `GET /posts`               |
//! | `Query.post`   | `GET /posts/{id}`          |
//! | `Query.users`  | `GET /users`               |
//! | `Query.user`   | `GET /users/{id}`          |
//! | `Post.author`  | `GET /users/{post.userId}` |
//! | `User.posts`   | `GET /users/{user.id}/posts` |
//! | `Mutation.addPost` | `POST /posts`          |

use super::client::RestClient;
use crate::core::error::SchemaError;
use crate::schema::resolver::{self, AsyncResolver, ResolverCall};
use crate::schema::Schema;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub const BLOG_SDL: &str = r#"
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
  }

  type Mutation {
    addPost(title: String!, body: String!, userId: Int!): Post!
  }

  schema {
    query: Query
    mutation: Mutation
  }
"#;

/// Build the blog schema on top of `client`
pub fn blog_schema(client: RestClient) -> Result<Schema, SchemaError> {
    let fetch = |route: Route| resolver::from_async(Fetch {
        client: client.clone(),
        route,
    });

    Schema::builder()
        .sdl(BLOG_SDL)
        .resolver("Query", "posts", fetch(Route::Posts))
        .resolver("Query", "post", fetch(Route::Post))
        .resolver("Query", "users", fetch(Route::Users))
        .resolver("Query", "user", fetch(Route::User))
        .resolver("Post", "author", fetch(Route::Author))
        .resolver("User", "posts", fetch(Route::UserPosts))
        .resolver(
            "Mutation",
            "addPost",
            resolver::from_async(AddPost {
                client: client.clone(),
            }),
        )
        .build()
}

#[derive(Debug, Clone, Copy)]
enum Route {
    Posts,
    Post,
    Users,
    User,
    Author,
    UserPosts,
}

impl Route {
    /// Path to fetch, or `None` when the parent has no key to follow
    fn path(self, call: &ResolverCall) -> Result<Option<String>> {
        let parent_key = |key: &str| call.parent.get(key).and_then(Value::as_i64);

        Ok(match self {
            Route::Posts => Some("/posts".to_string()),
            Route::Post => Some(format!("/posts/{}", call.args.i64("id")?)),
            Route::Users => Some("/users".to_string()),
            Route::User => Some(format!("/users/{}", call.args.i64("id")?)),
            Route::Author => parent_key("userId").map(|id| format!("/users/{}", id)),
            Route::UserPosts => parent_key("id").map(|id| format!("/users/{}/posts", id)),
        })
    }
}

/// GET resolver for one route
struct Fetch {
    client: RestClient,
    route: Route,
}

#[async_trait]
impl AsyncResolver for Fetch {
    async fn resolve(&self, call: ResolverCall) -> Result<Value> {
        match self.route.path(&call)? {
            Some(path) => Ok(self.client.get_json(&path).await?),
            None => Ok(Value::Null),
        }
    }
}

/// Creates a post and answers with the new id merged into the input
struct AddPost {
    client: RestClient,
}

#[async_trait]
impl AsyncResolver for AddPost {
    async fn resolve(&self, call: ResolverCall) -> Result<Value> {
        let input = call.args.into_value();
        let created = self.client.post_json("/posts", &input).await?;

        let mut post = Map::new();
        post.insert(
            "id".to_string(),
            created.get("id").cloned().unwrap_or(Value::Null),
        );
        if let Value::Object(fields) = input {
            post.extend(fields);
        }
        Ok(Value::Object(post))
    }
}
