//! Turns a handler [`Response`] into status, content type and bytes.
//!
//! Rendering never fails: a missing template or a body that cannot be serialized
//! becomes a `500` with an empty body, and the handler's status is dropped.

use crate::api::response::{Body, Response};
use crate::viewer;
use async_trait::async_trait;
use axum::body::Bytes;
use http::StatusCode;
use log::{error, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_HTML: &str = "text/html";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),
    #[error("Failed to read template '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of HTML templates, looked up by name
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn read_template(&self, name: &str) -> Result<String, TemplateError>;
}

/// Reads `<dir>/<name>.html` from disk on every lookup
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    dir: PathBuf,
}

impl DirectoryTemplates {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TemplateStore for DirectoryTemplates {
    async fn read_template(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.dir.join(format!("{name}.html"));
        tokio::fs::read_to_string(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TemplateError::NotFound(name.to_string())
            } else {
                TemplateError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })
    }
}

/// In-memory templates keyed by name
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: HashMap<String, String>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template<N: Into<String>, C: Into<String>>(mut self, name: N, contents: C) -> Self {
        self.templates.insert(name.into(), contents.into());
        self
    }
}

#[async_trait]
impl TemplateStore for StaticTemplates {
    async fn read_template(&self, name: &str) -> Result<String, TemplateError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }
}

/// Wire form of a rendered response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: Bytes,
}

impl Rendered {
    fn failed() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: None,
            body: Bytes::new(),
        }
    }
}

#[derive(Clone)]
pub struct Renderer {
    templates: Arc<dyn TemplateStore>,
    context: BTreeMap<String, String>,
}

impl Renderer {
    /// Create a renderer whose template context holds `hostname`
    pub fn new<S: Into<String>>(templates: Arc<dyn TemplateStore>, hostname: S) -> Self {
        let mut context = BTreeMap::new();
        context.insert("hostname".to_string(), hostname.into());
        Self { templates, context }
    }

    /// Add a server-wide substitution value
    pub fn with_context_value<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub async fn render(&self, response: &Response) -> Rendered {
        match &response.body {
            Body::Empty => Rendered {
                status: response.status,
                content_type: None,
                body: Bytes::new(),
            },
            Body::Template(template) => match self.templates.read_template(&template.name).await {
                Ok(contents) => Rendered {
                    status: response.status,
                    content_type: Some(CONTENT_TYPE_HTML),
                    body: Bytes::from(viewer::substitute(&contents, &self.context)),
                },
                Err(e) => {
                    warn!(
                        "Failed to render template, replacing status {} with 500: {}",
                        response.status, e
                    );
                    Rendered::failed()
                }
            },
            Body::Json(body) => match body.to_json() {
                Ok(bytes) => Rendered {
                    status: response.status,
                    content_type: Some(CONTENT_TYPE_JSON),
                    body: Bytes::from(bytes),
                },
                Err(e) => {
                    error!(
                        "Failed to serialize response body, replacing status {} with 500: {}",
                        response.status, e
                    );
                    Rendered::failed()
                }
            },
        }
    }
}
