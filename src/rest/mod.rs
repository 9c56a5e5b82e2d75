//! REST-backed resolvers
//!
//! [`RestClient`] wraps `reqwest` for JSON APIs; [`blog`] uses it to serve a
//! small blog schema from a JSONPlaceholder-style backend.

pub mod blog;
pub mod client;

pub use blog::{BLOG_SDL, blog_schema};
pub use client::{RestClient, RestError};
