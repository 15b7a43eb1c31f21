use crate::api::endpoint::Endpoint;
use crate::api::logging::RequestRecord;
use crate::api::metrics::Metrics;
use crate::api::render::{StaticTemplates, TemplateStore};
use crate::api::{Server, ServerConfig};
use crate::identity::{IntrospectionError, TokenIntrospector, User};
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::Router;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// URI of a local port nothing listens on
pub fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe port");
    let addr = listener.local_addr().expect("Failed to read probe address");
    drop(listener);
    format!("http://{addr}")
}

/// What a [`FakeIntrospector`] answers for every token
#[derive(Debug, Clone)]
enum FakeOutcome {
    User(User),
    Reject,
    Status(StatusCode),
}

/// In-process token introspector that records the tokens it was asked about
#[derive(Debug)]
pub struct FakeIntrospector {
    outcome: Mutex<FakeOutcome>,
    delay: Option<Duration>,
    tokens: Mutex<Vec<String>>,
}

impl FakeIntrospector {
    fn new(outcome: FakeOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            delay: None,
            tokens: Mutex::new(Vec::new()),
        }
    }

    /// Accept every token as `user`
    pub fn with_user(user: User) -> Self {
        Self::new(FakeOutcome::User(user))
    }

    /// Reject every token
    pub fn rejecting() -> Self {
        Self::new(FakeOutcome::Reject)
    }

    /// Fail every call as if the endpoint answered with `status`
    pub fn failing_with_status(status: StatusCode) -> Self {
        Self::new(FakeOutcome::Status(status))
    }

    /// Sleep before answering
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the user returned from now on, `None` rejects tokens
    pub fn set_user(&self, user: Option<User>) {
        let outcome = match user {
            Some(user) => FakeOutcome::User(user),
            None => FakeOutcome::Reject,
        };
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Tokens received so far, in order
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenIntrospector for FakeIntrospector {
    async fn check_token(&self, token: &str) -> Result<User, IntrospectionError> {
        self.tokens.lock().unwrap().push(token.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            FakeOutcome::User(user) => Ok(user),
            FakeOutcome::Reject => Err(IntrospectionError::Rejected("invalid token".to_string())),
            FakeOutcome::Status(status) => Err(IntrospectionError::InvalidStatus(status)),
        }
    }
}

/// Test fixture wiring a [`Server`] router to a fake introspector and a
/// channel-backed request logger.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::with_user(
///         User { id: "some-id".to_string(), ..Default::default() },
///         vec![Endpoint::get("/me", AuthRequirement::AnyAuthenticated, |r| {
///             Response::ok(r.current_user().cloned())
///         })],
///     );
///
///     let response = fixture.get("/me", Some("Bearer token")).await;
///     response.assert_ok();
///     let record = fixture.next_record().await;
///     assert_eq!(record.written_status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Introspector answering every token lookup
    pub introspector: Arc<FakeIntrospector>,
    /// Metrics registry injected into the server
    pub metrics: Arc<Metrics>,
    records: tokio::sync::Mutex<mpsc::UnboundedReceiver<RequestRecord>>,
}

impl TestFixture {
    /// Build a fixture with in-memory templates
    pub fn new(
        introspector: FakeIntrospector,
        templates: StaticTemplates,
        endpoints: Vec<Endpoint>,
    ) -> Self {
        let introspector = Arc::new(introspector);
        Self::with_config(
            ServerConfig::new(introspector.clone())
                .with_templates(Arc::new(templates) as Arc<dyn TemplateStore>),
            introspector,
            endpoints,
        )
    }

    /// Build a fixture from a prepared config; the request logger and metrics are replaced
    pub fn with_config(
        config: ServerConfig,
        introspector: Arc<FakeIntrospector>,
        endpoints: Vec<Endpoint>,
    ) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(Metrics::new());
        let config = config
            .with_hostname("example.com")
            .with_endpoints(endpoints)
            .with_metrics(metrics.clone())
            .with_request_logger(Arc::new(move |record: &RequestRecord| {
                let _ = tx.send(record.clone());
            }));

        let server = Server::new(config).expect("Failed to build server");

        Self {
            app: server.router(),
            introspector,
            metrics,
            records: tokio::sync::Mutex::new(rx),
        }
    }

    /// Fixture whose introspector accepts every token as `user`
    pub fn with_user(user: User, endpoints: Vec<Endpoint>) -> Self {
        Self::new(
            FakeIntrospector::with_user(user),
            StaticTemplates::new(),
            endpoints,
        )
    }

    /// Fixture whose introspector rejects every token
    pub fn rejecting_tokens(endpoints: Vec<Endpoint>) -> Self {
        Self::new(
            FakeIntrospector::rejecting(),
            StaticTemplates::new(),
            endpoints,
        )
    }

    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Request builder with an optional `Authorization` header
    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        authorization: Option<&str>,
    ) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());
        if let Some(authorization) = authorization {
            builder = builder.header("Authorization", authorization);
        }
        builder
    }

    pub async fn get(&self, uri: impl AsRef<str>, authorization: Option<&str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, authorization)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        authorization: Option<&str>,
        body: &T,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri, authorization)
            .header("Content-Type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            content_type,
            body,
        }
    }

    /// Wait for the next request record emitted by the logger
    pub async fn next_record(&self) -> RequestRecord {
        let mut records = self.records.lock().await;
        tokio::time::timeout(Duration::from_secs(1), records.recv())
            .await
            .expect("Timed out waiting for a request record")
            .expect("Request logger channel closed")
    }

    /// Assert that no further request record shows up
    pub async fn assert_no_more_records(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut records = self.records.lock().await;
        assert!(
            records.try_recv().is_err(),
            "Expected no more request records"
        );
    }
}

/// Response from a test request
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to deserialize response JSON")
    }
}
