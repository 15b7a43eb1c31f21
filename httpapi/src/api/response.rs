use crate::errors::{ErrorListResponse, ErrorResponse};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Marker body: render the named HTML template instead of JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTemplate {
    pub name: String,
}

impl HtmlTemplate {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

/// A value that is serialized to JSON when the response is rendered
pub trait JsonBody: Send + Sync {
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error>;
}

impl<T: Serialize + Send + Sync> JsonBody for T {
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Clone)]
pub enum Body {
    Empty,
    Json(Arc<dyn JsonBody>),
    Template(HtmlTemplate),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Json(_) => f.write_str("Json(..)"),
            Body::Template(template) => f.debug_tuple("Template").field(template).finish(),
        }
    }
}

/// The abstract result of a handler, turned into bytes by the renderer
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub body: Body,
    pub headers: HeaderMap,
}

impl Response {
    pub fn new(status: StatusCode, body: Body) -> Self {
        Self {
            status,
            body,
            headers: HeaderMap::new(),
        }
    }

    /// Response with a status and no body
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Body::Empty)
    }

    /// Response whose body is serialized to JSON at render time
    pub fn json<T: Serialize + Send + Sync + 'static>(status: StatusCode, body: T) -> Self {
        Self::new(status, Body::Json(Arc::new(body)))
    }

    /// Response rendered from the named HTML template
    pub fn template<S: Into<String>>(status: StatusCode, name: S) -> Self {
        Self::new(status, Body::Template(HtmlTemplate::new(name)))
    }

    pub fn ok<T: Serialize + Send + Sync + 'static>(body: T) -> Self {
        Self::json(StatusCode::OK, body)
    }

    pub fn ok_template<S: Into<String>>(name: S) -> Self {
        Self::template(StatusCode::OK, name)
    }

    pub fn created() -> Self {
        Self::empty(StatusCode::CREATED)
    }

    pub fn no_content() -> Self {
        Self::empty(StatusCode::NO_CONTENT)
    }

    pub fn deleted() -> Self {
        Self::empty(StatusCode::NO_CONTENT)
    }

    pub fn unauthorized() -> Self {
        Self::empty(StatusCode::UNAUTHORIZED)
    }

    pub fn bad_request<E: fmt::Display>(err: E) -> Self {
        Self::error(StatusCode::BAD_REQUEST, err)
    }

    pub fn validation_error(errors: Vec<ErrorResponse>) -> Self {
        Self::json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorListResponse { errors },
        )
    }

    pub fn unprocessable_entity<E: fmt::Display>(err: E) -> Self {
        Self::error(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn server_error<E: fmt::Display>(err: E) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E: fmt::Display>(err: E) -> Self {
        Self::error(StatusCode::NOT_FOUND, err)
    }

    pub fn forbidden<E: fmt::Display>(err: E) -> Self {
        Self::error(StatusCode::FORBIDDEN, err)
    }

    /// Add a header that is written alongside the rendered body
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    fn error<E: fmt::Display>(status: StatusCode, err: E) -> Self {
        Self::json(status, ErrorListResponse::single(err))
    }
}
