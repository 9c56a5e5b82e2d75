//! Per-request state shared by all resolvers of one execution

use crate::core::auth::{AuthContext, AuthPolicy};
use anyhow::{Result, bail};
use axum::http::Extensions;
use uuid::Uuid;

/// State for a single incoming request
///
/// Created fresh for every request and dropped once the response envelope is
/// assembled. Resolvers of that request see it behind an `Arc`, read-only.
#[derive(Debug)]
pub struct RequestContext {
    request_id: Uuid,
    auth: AuthContext,
    resources: Extensions,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            auth: AuthContext::Anonymous,
            resources: Extensions::new(),
        }
    }

    /// Attach the caller identity
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }

    /// Attach a resource resolvers can look up by type (a client, a loader, ...)
    ///
    /// Inserting a second value of the same type replaces the first.
    pub fn with_resource<T: Clone + Send + Sync + 'static>(mut self, resource: T) -> Self {
        self.resources.insert(resource);
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Look up a resource attached with [`RequestContext::with_resource`]
    pub fn resource<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.resources.get::<T>()
    }

    /// Fail unless the caller satisfies `policy`
    ///
    /// Meant to be called from resolvers; the error becomes a field error.
    pub fn authorize(&self, policy: &AuthPolicy) -> Result<()> {
        if !policy.check(&self.auth) {
            bail!("Not authorized to access this field");
        }
        Ok(())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
