use crate::api::auth::AuthRequirement;
use crate::api::request::Request;
use crate::api::response::Response;
use axum::routing::MethodFilter;
use http::Method;
use std::fmt;
use std::sync::Arc;

pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// A route registered on the server at construction time
#[derive(Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: Method,
    pub auth: AuthRequirement,
    pub handler: Handler,
}

impl Endpoint {
    pub fn new<P, F>(method: Method, path: P, auth: AuthRequirement, handler: F) -> Self
    where
        P: Into<String>,
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            method,
            auth,
            handler: Arc::new(handler),
        }
    }

    pub fn get<P, F>(path: P, auth: AuthRequirement, handler: F) -> Self
    where
        P: Into<String>,
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        Self::new(Method::GET, path, auth, handler)
    }

    pub fn post<P, F>(path: P, auth: AuthRequirement, handler: F) -> Self
    where
        P: Into<String>,
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        Self::new(Method::POST, path, auth, handler)
    }

    pub fn put<P, F>(path: P, auth: AuthRequirement, handler: F) -> Self
    where
        P: Into<String>,
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        Self::new(Method::PUT, path, auth, handler)
    }

    pub fn delete<P, F>(path: P, auth: AuthRequirement, handler: F) -> Self
    where
        P: Into<String>,
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        Self::new(Method::DELETE, path, auth, handler)
    }

    /// Key used for metrics and logs, e.g. `GET /v1/info`
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Check that the endpoint can be registered on a router
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.path.is_empty() {
            return Err("path cannot be empty");
        }
        if !self.path.starts_with('/') {
            return Err("path must start with '/'");
        }
        if MethodFilter::try_from(self.method.clone()).is_err() {
            return Err("unsupported method");
        }
        Ok(())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
