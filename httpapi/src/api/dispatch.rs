//! The per-request pipeline behind every registered endpoint.
//!
//! A request moves through `Received -> Identified -> Authorized | Denied -> Rendered`.
//! The handler only runs when authorization succeeds, and the request logger is
//! called exactly once per request after rendering, whatever branch was taken.
//! An authorized request whose body does not fit in [`MAX_BODY_BYTES`] is answered
//! with 413 instead of reaching the handler.

use crate::api::auth::Decision;
use crate::api::endpoint::Endpoint;
use crate::api::logging::{RequestLogger, RequestRecord};
use crate::api::metrics::Metrics;
use crate::api::render::{Rendered, Renderer};
use crate::api::request::Request;
use crate::api::response::Response;
use crate::identity::IdentityResolver;
use axum::extract::{FromRequestParts, Path};
use axum::response::Response as HttpResponse;
use chrono::Utc;
use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Upper bound on the request body handed to handlers
pub(crate) const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub(crate) struct Dispatcher {
    pub(crate) resolver: IdentityResolver,
    pub(crate) renderer: Renderer,
    pub(crate) logger: Arc<dyn RequestLogger>,
    pub(crate) metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub(crate) async fn dispatch(
        &self,
        endpoint: Arc<Endpoint>,
        request: axum::extract::Request,
    ) -> HttpResponse {
        // Received
        let started_at = Utc::now();
        let start = Instant::now();
        let (mut parts, body) = request.into_parts();

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let path_params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
            .await
            .map(|Path(params)| params)
            .unwrap_or_default();

        let (body, body_read) = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(body) => (body, true),
            Err(e) => {
                warn!("Failed to read request body for {}: {}", endpoint.key(), e);
                (Default::default(), false)
            }
        };

        // Identified
        let current_user = self.resolver.resolve(auth_header.as_deref()).await;

        let request = Request::builder()
            .method(parts.method.clone())
            .path(parts.uri.path())
            .path_params(path_params)
            .query(parts.uri.query().unwrap_or_default())
            .body(body)
            .current_user(current_user)
            .build();

        // Authorized | Denied
        let response = match endpoint.auth.evaluate(request.current_user()) {
            Decision::Allow if !body_read => Response::empty(http::StatusCode::PAYLOAD_TOO_LARGE),
            Decision::Allow => invoke_handler(&endpoint, &request),
            Decision::Deny => {
                debug!("Denied {} for {}", endpoint.key(), request.path());
                Response::unauthorized()
            }
        };

        // Rendered
        let rendered = self.renderer.render(&response).await;
        let elapsed = start.elapsed();
        let written_status = rendered.status;
        let http_response = to_http_response(&response, rendered);

        self.metrics.record(&endpoint.key(), written_status, elapsed);

        let record = RequestRecord {
            request,
            response,
            written_status,
            endpoint,
            started_at,
            elapsed,
        };
        let logger = Arc::clone(&self.logger);
        tokio::spawn(async move { logger.log_request(&record) });

        http_response
    }
}

/// Run the handler, turning a panic into an empty 500
fn invoke_handler(endpoint: &Endpoint, request: &Request) -> Response {
    match catch_unwind(AssertUnwindSafe(|| (endpoint.handler)(request))) {
        Ok(response) => response,
        Err(_) => {
            error!("Handler for {} panicked", endpoint.key());
            Response::empty(http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn to_http_response(response: &Response, rendered: Rendered) -> HttpResponse {
    let mut http_response = HttpResponse::new(axum::body::Body::from(rendered.body));
    *http_response.status_mut() = rendered.status;

    let headers = http_response.headers_mut();
    headers.extend(response.headers.clone());
    match rendered.content_type {
        Some(content_type) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        None => {
            headers.remove(CONTENT_TYPE);
        }
    }

    http_response
}
