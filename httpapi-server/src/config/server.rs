use confique::Config;
use std::time::Duration;

/// Listener, templates and request pipeline settings
#[derive(Debug, Config, Clone)]
pub struct ServerSection {
    /// The port the server will listen to (default: 8080)
    #[config(env = "HTTPAPI_PORT", default = 8080)]
    pub port: u16,

    /// Hostname substituted into HTML templates (default: localhost)
    #[config(env = "HTTPAPI_HOSTNAME", default = "localhost")]
    pub hostname: String,

    /// Directory holding `<name>.html` templates (default: templates)
    #[config(env = "HTTPAPI_TEMPLATES_DIR", default = "templates")]
    pub templates_dir: String,

    /// Directory served under `/assets/`, disabled when unset
    #[config(env = "HTTPAPI_ASSETS_DIR")]
    pub assets_dir: Option<String>,

    /// Upper bound for a token introspection call in milliseconds, unbounded when unset
    #[config(env = "HTTPAPI_INTROSPECTION_TIMEOUT_MS")]
    pub introspection_timeout_ms: Option<u64>,
}

impl ServerSection {
    pub fn introspection_timeout(&self) -> Option<Duration> {
        self.introspection_timeout_ms.map(Duration::from_millis)
    }
}
