//! services/api/src/adapters/auth.rs
//!
//! `AuthProvider` implementations. Login itself is handled by the external
//! auth provider; these adapters only surface whoever it says is signed in.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use scrollnet_core::ports::{AuthProvider, AuthUser, PortResult};

/// A fixed user (or none) for the lifetime of the process or connection.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthProvider {
    user: Option<AuthUser>,
}

impl StaticAuthProvider {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn signed_in(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: Some(AuthUser {
                id: id.into(),
                token: token.into(),
            }),
        }
    }

    /// Reads the signed-in user from the request headers set by the auth
    /// provider's edge: `x-user-id`, plus the bearer token if present.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();

        match user_id {
            Some(id) => Self::signed_in(id, token),
            None => Self::anonymous(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_user(&self) -> PortResult<Option<AuthUser>> {
        Ok(self.user.clone())
    }
}
