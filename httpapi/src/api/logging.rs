use crate::api::endpoint::Endpoint;
use crate::api::request::Request;
use crate::api::response::Response;
use chrono::{DateTime, Utc};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Everything known about a dispatched request once its response is rendered
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub request: Request,
    /// The response returned by the handler, or the synthesized 401/500
    pub response: Response,
    /// Status actually written, which differs from `response.status` when rendering failed
    pub written_status: http::StatusCode,
    pub endpoint: Arc<Endpoint>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Receives one record per dispatched request
pub trait RequestLogger: Send + Sync {
    fn log_request(&self, record: &RequestRecord);
}

impl<F> RequestLogger for F
where
    F: Fn(&RequestRecord) + Send + Sync,
{
    fn log_request(&self, record: &RequestRecord) {
        self(record)
    }
}

/// Default logger, writes one `info` line per request
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequests;

impl RequestLogger for LogRequests {
    fn log_request(&self, record: &RequestRecord) {
        let user = record
            .request
            .current_user()
            .map(|u| u.id.as_str())
            .unwrap_or("-");
        info!(
            "{} {} -> {} (user: {}, started: {}, took: {:?})",
            record.endpoint.method,
            record.request.path(),
            record.written_status.as_u16(),
            user,
            record.started_at.to_rfc3339(),
            record.elapsed
        );
    }
}

/// Logger that drops every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl RequestLogger for NoopLogger {
    fn log_request(&self, _record: &RequestRecord) {}
}
