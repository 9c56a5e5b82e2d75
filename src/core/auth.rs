//! Caller identity for resolvers
//!
//! Resolvers receive the caller identity through the request context and
//! decide on their own whether the caller may see a field:
//!
//! ```rust,ignore
//! resolver::from_fn(|call| {
//!     call.context.authorize(&AuthPolicy::HasRole(vec!["editor".into()]))?;
//!     Ok(call.parent.get("draft").cloned().unwrap_or_default())
//! })
//! ```

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;

/// Identity of the caller of one request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthContext {
    /// Authenticated user
    User { user_id: String, roles: Vec<String> },

    /// Service-to-service communication
    Service { service_name: String },

    /// No authentication (public access)
    #[default]
    Anonymous,
}

impl AuthContext {
    /// Get user_id if available
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthContext::User { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    /// Check if the caller carries a role
    pub fn has_role(&self, role: &str) -> bool {
        match self {
            AuthContext::User { roles, .. } => roles.iter().any(|r| r == role),
            _ => false,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthContext::Anonymous)
    }
}

/// Access rule a resolver can check against the caller
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated caller
    Authenticated,

    /// User must have one of these roles
    HasRole(Vec<String>),

    /// Service-to-service only
    ServiceOnly,

    /// Combination of policies (AND)
    And(Vec<AuthPolicy>),

    /// Combination of policies (OR)
    Or(Vec<AuthPolicy>),
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,
            AuthPolicy::Authenticated => !context.is_anonymous(),
            AuthPolicy::HasRole(required) => required.iter().any(|r| context.has_role(r)),
            AuthPolicy::ServiceOnly => matches!(context, AuthContext::Service { .. }),
            AuthPolicy::And(policies) => policies.iter().all(|p| p.check(context)),
            AuthPolicy::Or(policies) => policies.iter().any(|p| p.check(context)),
        }
    }
}

/// Extracts the caller identity from an incoming HTTP request
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext>;
}

/// Default no-auth provider: every caller is anonymous
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn extract_context(&self, _headers: &HeaderMap) -> Result<AuthContext> {
        Ok(AuthContext::Anonymous)
    }
}

/// Trusts identity headers set by an upstream gateway
///
/// `x-user-id` identifies the user, `x-user-roles` carries a comma separated
/// role list and `x-service-name` marks service callers.
pub struct HeaderAuthProvider;

#[async_trait]
impl AuthProvider for HeaderAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let header = |name: &str| -> Result<Option<String>> {
            match headers.get(name) {
                Some(value) => Ok(Some(value.to_str()?.trim().to_string())),
                None => Ok(None),
            }
        };

        if let Some(service_name) = header("x-service-name")? {
            return Ok(AuthContext::Service { service_name });
        }

        let Some(user_id) = header("x-user-id")? else {
            return Ok(AuthContext::Anonymous);
        };
        let roles = header("x-user-roles")?
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AuthContext::User { user_id, roles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_policy_check() {
        let user = AuthContext::User {
            user_id: "9".to_string(),
            roles: vec!["editor".to_string()],
        };

        assert!(AuthPolicy::Authenticated.check(&user));
        assert!(AuthPolicy::HasRole(vec!["editor".into()]).check(&user));
        assert!(!AuthPolicy::ServiceOnly.check(&user));

        let anon = AuthContext::Anonymous;
        assert!(AuthPolicy::Public.check(&anon));
        assert!(!AuthPolicy::Authenticated.check(&anon));
    }

    #[test]
    fn test_policy_combinators() {
        let service = AuthContext::Service {
            service_name: "billing".to_string(),
        };
        let either = AuthPolicy::Or(vec![
            AuthPolicy::ServiceOnly,
            AuthPolicy::HasRole(vec!["admin".into()]),
        ]);
        let both = AuthPolicy::And(vec![AuthPolicy::Authenticated, AuthPolicy::ServiceOnly]);
        assert!(either.check(&service));
        assert!(both.check(&service));
        assert!(!both.check(&AuthContext::Anonymous));
    }

    #[tokio::test]
    async fn test_header_provider_reads_user() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("9"));
        headers.insert("x-user-roles", HeaderValue::from_static("editor, admin,"));

        let ctx = HeaderAuthProvider.extract_context(&headers).await.unwrap();
        assert_eq!(ctx.user_id(), Some("9"));
        assert!(ctx.has_role("admin"));
        assert!(ctx.has_role("editor"));
    }

    #[tokio::test]
    async fn test_header_provider_defaults_to_anonymous() {
        let ctx = HeaderAuthProvider
            .extract_context(&HeaderMap::new())
            .await
            .unwrap();
        assert!(ctx.is_anonymous());

        let ctx = NoAuthProvider
            .extract_context(&HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(ctx, AuthContext::Anonymous);
    }
}
