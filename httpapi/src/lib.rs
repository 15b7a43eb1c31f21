//! Thin HTTP API toolkit on top of axum.
//!
//! Endpoints declare an [`AuthRequirement`]; every request has its bearer token
//! introspected, is authorized against that requirement, is handed to the endpoint's
//! handler and has the handler's [`Response`] rendered as JSON or as an HTML template.
//! Outbound clients for token introspection and plain REST calls live in [`clients`].

pub mod api;
pub mod clients;
pub mod errors;
pub mod identity;
pub mod viewer;

#[cfg(test)]
mod test_utils;

pub use api::auth::{AuthRequirement, Decision};
pub use api::endpoint::Endpoint;
pub use api::info::InfoResponse;
pub use api::logging::{LogRequests, RequestLogger, RequestRecord};
pub use api::metrics::Metrics;
pub use api::request::Request;
pub use api::response::Response;
pub use api::{RunningServer, Server, ServerConfig};
pub use clients::{RestClient, RestError, UaaClient};
pub use errors::{ErrorListResponse, ErrorResponse, ServerError};
pub use identity::{IntrospectionError, TokenIntrospector, User};
