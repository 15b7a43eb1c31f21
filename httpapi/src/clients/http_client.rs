use crate::clients::ClientError;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared outbound HTTP wrapper: a base URL plus a configured [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    host: Url,
}

impl HttpClient {
    /// Create a client for `host`.
    ///
    /// `skip_ssl_validation` disables certificate verification, for test environments
    /// with self-signed certificates.
    pub fn new(host: &str, skip_ssl_validation: bool) -> Result<Self, ClientError> {
        if host.is_empty() {
            return Err(ClientError::EmptyHost);
        }

        let host = Url::parse(host).map_err(|source| ClientError::InvalidHost {
            host: host.to_string(),
            source,
        })?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(skip_ssl_validation)
            .build()?;

        Ok(Self { client, host })
    }

    pub fn get(&self, endpoint: &str) -> RequestBuilder {
        self.client.get(self.url(endpoint))
    }

    pub fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client.post(self.url(endpoint))
    }

    pub fn put(&self, endpoint: &str) -> RequestBuilder {
        self.client.put(self.url(endpoint))
    }

    pub fn delete(&self, endpoint: &str) -> RequestBuilder {
        self.client.delete(self.url(endpoint))
    }

    /// The host followed by `endpoint`, e.g. `http://localhost` + `/endpoint`
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.host.as_str().trim_end_matches('/'), endpoint)
    }
}
