pub mod auth;
mod dispatch;
pub mod endpoint;
pub mod info;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod request;
pub mod response;

use crate::api::dispatch::Dispatcher;
use crate::api::endpoint::Endpoint;
use crate::api::logging::{LogRequests, RequestLogger};
use crate::api::metrics::{metrics_handler, Metrics};
use crate::api::render::{DirectoryTemplates, Renderer, TemplateStore};
use crate::errors::ServerError;
use crate::identity::{IdentityResolver, TokenIntrospector};
use axum::routing::{get, on, MethodFilter, MethodRouter};
use axum::Router;
use http::StatusCode;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

/// Everything needed to construct a [`Server`]
pub struct ServerConfig {
    /// Validates bearer tokens for every request
    pub introspector: Arc<dyn TokenIntrospector>,
    pub endpoints: Vec<Endpoint>,
    /// Substituted for `{{hostname}}` in templates
    pub hostname: String,
    /// Port to listen on, 0 lets the OS choose
    pub port: u16,
    pub templates: Arc<dyn TemplateStore>,
    /// Served under `/assets/` when set
    pub assets_dir: Option<PathBuf>,
    pub request_logger: Arc<dyn RequestLogger>,
    pub metrics: Arc<Metrics>,
    /// Upper bound for a single token introspection call
    pub introspection_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn new(introspector: Arc<dyn TokenIntrospector>) -> Self {
        Self {
            introspector,
            endpoints: Vec::new(),
            hostname: "localhost".to_string(),
            port: 0,
            templates: Arc::new(DirectoryTemplates::new("templates")),
            assets_dir: None,
            request_logger: Arc::new(LogRequests),
            metrics: Arc::new(Metrics::new()),
            introspection_timeout: None,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_templates_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.templates = Arc::new(DirectoryTemplates::new(dir));
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateStore>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_assets_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    pub fn with_request_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.request_logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_introspection_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.introspection_timeout = timeout;
        self
    }
}

/// An HTTP server built from a fixed set of endpoints
pub struct Server {
    router: Router,
    port: u16,
}

impl Server {
    /// Validate the endpoints and build the router.
    ///
    /// When two endpoints share a method and path, the one registered last wins.
    /// Endpoints on `/debug/metrics`, on `/assets` when an assets dir is set, or on
    /// patterns the router cannot tell apart (e.g. `/items/{id}` and `/items/{name}`)
    /// are rejected.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let serves_assets = config.assets_dir.is_some();
        let mut endpoints: BTreeMap<(String, String), Arc<Endpoint>> = BTreeMap::new();
        for endpoint in config.endpoints {
            endpoint
                .validate()
                .and_then(|()| check_reserved(&endpoint.path, serves_assets))
                .map_err(|reason| ServerError::InvalidEndpoint {
                    method: endpoint.method.to_string(),
                    path: endpoint.path.clone(),
                    reason,
                })?;

            let key = (endpoint.path.clone(), endpoint.method.to_string());
            if endpoints.insert(key, Arc::new(endpoint)).is_some() {
                warn!("Endpoint registered twice, keeping the last registration");
            }
        }

        let dispatcher = Dispatcher {
            resolver: IdentityResolver::new(config.introspector)
                .with_timeout(config.introspection_timeout),
            renderer: Renderer::new(config.templates, config.hostname),
            logger: config.request_logger,
            metrics: Arc::clone(&config.metrics),
        };

        let mut routes: BTreeMap<String, MethodRouter> = BTreeMap::new();
        for endpoint in endpoints.into_values() {
            // validate() already rejected methods without a filter
            let Ok(filter) = MethodFilter::try_from(endpoint.method.clone()) else {
                continue;
            };
            debug!("Registering endpoint {}", endpoint.key());

            let path = endpoint.path.clone();
            let dispatcher = dispatcher.clone();
            let handler = move |request: axum::extract::Request| {
                let dispatcher = dispatcher.clone();
                let endpoint = Arc::clone(&endpoint);
                async move { dispatcher.dispatch(endpoint, request).await }
            };
            let method_router = match routes.remove(&path) {
                Some(existing) => guard_routing(&path, || existing.on(filter, handler))?,
                None => on(filter, handler),
            };
            routes.insert(path, method_router);
        }

        let mut router = Router::new().route(
            METRICS_PATH,
            get(metrics_handler)
                .fallback(not_found)
                .with_state(config.metrics),
        );
        for (path, method_router) in routes {
            let method_router = method_router.fallback(not_found);
            router = guard_routing(&path, || router.route(&path, method_router))?;
        }

        if let Some(assets_dir) = config.assets_dir {
            router = guard_routing(ASSETS_PATH, || {
                router.nest_service(ASSETS_PATH, ServeDir::new(assets_dir))
            })?;
        }

        Ok(Self {
            router,
            port: config.port,
        })
    }

    /// The router serving every endpoint, for embedding or for tests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Serve in the foreground until `shutdown` completes
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        info!("Server running on {}", listener.local_addr()?);
        info!("HTTP metrics now available at /debug/metrics");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Bind the port and serve in a background task
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        let listener = self.bind().await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let router = self.router;
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("Server running on {}", local_addr);
        info!("HTTP metrics now available at /debug/metrics");
        Ok(RunningServer {
            local_addr,
            shutdown: shutdown_tx,
            handle,
        })
    }
}

const METRICS_PATH: &str = "/debug/metrics";
const ASSETS_PATH: &str = "/assets";

/// Paths owned by the server itself
fn check_reserved(path: &str, serves_assets: bool) -> Result<(), &'static str> {
    if path == METRICS_PATH {
        return Err("path is reserved for metrics");
    }
    let under_assets = path
        .strip_prefix(ASSETS_PATH)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    if serves_assets && under_assets {
        return Err("path is reserved for assets");
    }
    Ok(())
}

/// Routes that do not match the request method answer 404 like unknown paths
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Run a router mutation, turning axum's registration panic into a conflict error
fn guard_routing<T>(path: &str, register: impl FnOnce() -> T) -> Result<T, ServerError> {
    catch_unwind(AssertUnwindSafe(register)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "route conflicts with an existing route".to_string());
        ServerError::RouteConflict {
            path: path.to_string(),
            reason,
        }
    })
}

/// Handle to a server started with [`Server::start`]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish
    pub async fn stop(self) -> Result<(), ServerError> {
        let _ = self.shutdown.send(());
        self.handle.await.map_err(std::io::Error::other)??;
        info!("Server on {} stopped", self.local_addr);
        Ok(())
    }
}
