//! Identity resolution: turning an `Authorization` header into a [`User`].
//!
//! Token validation is delegated to a [`TokenIntrospector`]. Every failure of the
//! introspection call is treated as "no identity"; the error never reaches the caller.

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The identity behind a bearer token, as reported by the introspection endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct User {
    #[serde(rename = "user_id", default)]
    pub id: String,
    #[serde(rename = "user_name", default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "scope", default)]
    pub scopes: Vec<String>,
}

/// Errors that can occur while introspecting a token
#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("Failed to send introspection request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Introspection failed with status: {0}")]
    InvalidStatus(http::StatusCode),
    #[error("Failed to parse introspection response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Token rejected: {0}")]
    Rejected(String),
}

/// Validates a token against an external authority.
///
/// Implementations are shared between all in-flight requests and must not keep
/// per-request state.
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    async fn check_token(&self, token: &str) -> Result<User, IntrospectionError>;
}

/// Strip a case-insensitive `"bearer "` prefix from a raw `Authorization` value
pub fn bearer_token(header_value: &str) -> &str {
    const PREFIX: &str = "bearer ";
    match header_value.get(..PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(PREFIX) => &header_value[PREFIX.len()..],
        _ => header_value,
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    introspector: Arc<dyn TokenIntrospector>,
    timeout: Option<Duration>,
}

impl IdentityResolver {
    pub fn new(introspector: Arc<dyn TokenIntrospector>) -> Self {
        Self {
            introspector,
            timeout: None,
        }
    }

    /// Bound every introspection call; an expired call counts as no identity
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the identity for a raw `Authorization` header value.
    ///
    /// A missing header is resolved as an empty token, which is still handed to the
    /// introspector.
    pub async fn resolve(&self, header_value: Option<&str>) -> Option<User> {
        let token = bearer_token(header_value.unwrap_or_default());

        let result = match self.timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, self.introspector.check_token(token)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Token introspection timed out after {:?}", timeout);
                        return None;
                    }
                }
            }
            None => self.introspector.check_token(token).await,
        };

        match result {
            Ok(user) => Some(user),
            Err(e) => {
                debug!("Token introspection failed, continuing without identity: {}", e);
                None
            }
        }
    }
}
