use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-endpoint request statistics
#[derive(Debug, Default)]
struct EndpointStats {
    requests: AtomicU64,
    total_latency_us: AtomicU64,
    max_latency_us: AtomicU64,
    statuses: Mutex<BTreeMap<u16, u64>>,
}

impl EndpointStats {
    fn record(&self, status: u16, elapsed: Duration) {
        let latency = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us.fetch_add(latency, Ordering::Relaxed);
        self.max_latency_us.fetch_max(latency, Ordering::Relaxed);
        if let Ok(mut statuses) = self.statuses.lock() {
            *statuses.entry(status).or_default() += 1;
        }
    }

    fn snapshot(&self) -> EndpointSnapshot {
        EndpointSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            total_latency_us: self.total_latency_us.load(Ordering::Relaxed),
            max_latency_us: self.max_latency_us.load(Ordering::Relaxed),
            statuses: self
                .statuses
                .lock()
                .map(|s| s.iter().map(|(k, v)| (k.to_string(), *v)).collect())
                .unwrap_or_default(),
        }
    }
}

/// Request metrics shared by every request task
#[derive(Debug, Default)]
pub struct Metrics {
    total_requests: AtomicU64,
    endpoints: Mutex<BTreeMap<String, Arc<EndpointStats>>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EndpointSnapshot {
    pub requests: u64,
    pub total_latency_us: u64,
    pub max_latency_us: u64,
    pub statuses: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub endpoints: BTreeMap<String, EndpointSnapshot>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, endpoint: &str, status: http::StatusCode, elapsed: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let stats = match self.endpoints.lock() {
            Ok(mut endpoints) => endpoints.entry(endpoint.to_string()).or_default().clone(),
            Err(_) => return,
        };
        stats.record(status.as_u16(), elapsed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let endpoints = self
            .endpoints
            .lock()
            .map(|endpoints| {
                endpoints
                    .iter()
                    .map(|(key, stats)| (key.clone(), stats.snapshot()))
                    .collect()
            })
            .unwrap_or_default();

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            endpoints,
        }
    }
}

/// `GET /debug/metrics`
pub(crate) async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    Json(metrics.snapshot())
}
