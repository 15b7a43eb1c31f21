//! Outbound HTTP clients built on a shared [`HttpClient`] wrapper

use thiserror::Error;

pub mod http_client;
pub mod rest;
pub mod uaa;

pub use http_client::HttpClient;
pub use rest::{RestClient, RestError};
pub use uaa::UaaClient;

/// Errors raised while constructing a client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("host cannot be empty")]
    EmptyHost,
    #[error("invalid host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
    #[error("client id and secret must be set")]
    MissingCredentials,
}
