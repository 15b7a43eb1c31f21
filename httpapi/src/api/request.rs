use crate::identity::User;
use axum::body::Bytes;
use http::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Read-only view of an inbound request handed to endpoint handlers
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: Method,
    path: String,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
    body: Bytes,
    current_user: Option<User>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Look up a path parameter, falling back to the query string
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params
            .get(name)
            .or_else(|| self.query_params.get(name))
            .map(String::as_str)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Decode the body as JSON
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body bytes. Bodies over 10 MiB never reach a handler, they are answered with 413.
    pub fn raw_body(&self) -> &[u8] {
        &self.body
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Builds [`Request`] values, both for the dispatcher and for handler unit tests
#[derive(Debug, Default)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.inner.method = method;
        self
    }

    pub fn path<S: Into<String>>(mut self, path: S) -> Self {
        self.inner.path = path.into();
        self
    }

    pub fn path_param<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.inner.path_params.insert(name.into(), value.into());
        self
    }

    pub fn path_params(mut self, params: HashMap<String, String>) -> Self {
        self.inner.path_params = params;
        self
    }

    pub fn query_param<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.inner.query_params.insert(name.into(), value.into());
        self
    }

    /// Parse an url-encoded query string; the first value wins for repeated keys
    pub fn query(mut self, query: &str) -> Self {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.inner
                .query_params
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        self
    }

    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.inner.body = body.into();
        self
    }

    /// Serialize `value` as the JSON body
    pub fn json_body<T: serde::Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self.body(body))
    }

    pub fn current_user(mut self, user: Option<User>) -> Self {
        self.inner.current_user = user;
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}
