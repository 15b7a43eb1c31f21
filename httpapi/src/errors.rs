use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// A single error entry in an error list body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub description: String,
}

impl ErrorResponse {
    pub fn new<S: ToString>(description: S) -> Self {
        Self {
            description: description.to_string(),
        }
    }
}

/// Body shape used for every error response: `{"errors": [{"description": "..."}]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorListResponse {
    #[serde(default)]
    pub errors: Vec<ErrorResponse>,
}

impl ErrorListResponse {
    /// Wrap a single error message
    pub fn single<S: ToString>(description: S) -> Self {
        Self {
            errors: vec![ErrorResponse::new(description)],
        }
    }

    /// Error descriptions in the order they were reported
    pub fn descriptions(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.description.clone()).collect()
    }
}

/// Errors that prevent the server from being constructed or started
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid endpoint {method} '{path}': {reason}")]
    InvalidEndpoint {
        method: String,
        path: String,
        reason: &'static str,
    },
    #[error("Route '{path}' conflicts with another route: {reason}")]
    RouteConflict { path: String, reason: String },
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
