//! JSON REST client that forwards the caller's token to another API

use crate::clients::{ClientError, HttpClient};
use crate::errors::ErrorListResponse;
use axum::body::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::StatusCode;
use log::debug;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API returned status {status}: {}", .errors.descriptions().join(", "))]
    Api {
        status: StatusCode,
        errors: ErrorListResponse,
    },
    #[error("No errors specified. Received status {}", .0.as_u16())]
    Unexpected(StatusCode),
}

impl RestError {
    /// Error messages in a uniform shape, one per reported error
    pub fn descriptions(&self) -> Vec<String> {
        match self {
            RestError::Api { errors, .. } => errors.descriptions(),
            other => vec![other.to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestClient {
    client: HttpClient,
    user_token: String,
}

impl RestClient {
    /// `user_token` is sent verbatim as the `Authorization` header
    pub fn new(
        host: &str,
        skip_ssl_validation: bool,
        user_token: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: HttpClient::new(host, skip_ssl_validation)?,
            user_token: user_token.to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        let body = self.execute(self.client.get(path)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), RestError> {
        let request = self.client.put(path);
        self.execute(with_json(request, body)?).await?;
        Ok(())
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), RestError> {
        let request = self.client.post(path);
        self.execute(with_json(request, body)?).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), RestError> {
        self.execute(self.client.delete(path)).await?;
        Ok(())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Bytes, RestError> {
        let response = request
            .header(AUTHORIZATION, &self.user_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            return Ok(body);
        }

        debug!("REST call returned status {}", status);
        match serde_json::from_slice::<ErrorListResponse>(&body) {
            Ok(errors) => Err(RestError::Api { status, errors }),
            Err(_) => Err(RestError::Unexpected(status)),
        }
    }
}

fn with_json<B: Serialize + ?Sized>(
    request: RequestBuilder,
    body: &B,
) -> Result<RequestBuilder, RestError> {
    let body = serde_json::to_vec(body)?;
    Ok(request.header(CONTENT_TYPE, "application/json").body(body))
}
