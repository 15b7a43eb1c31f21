use confique::Config;

/// UAA token introspection settings
#[derive(Debug, Config, Clone)]
pub struct UaaConfig {
    /// Base URL of the UAA server
    #[config(env = "HTTPAPI_UAA_URL")]
    pub url: String,

    #[config(env = "HTTPAPI_UAA_CLIENT_ID")]
    pub client_id: String,

    #[config(env = "HTTPAPI_UAA_CLIENT_SECRET")]
    pub client_secret: String,

    /// Accept self-signed certificates (default: false)
    #[config(env = "HTTPAPI_UAA_SKIP_SSL_VALIDATION", default = false)]
    pub skip_ssl_validation: bool,
}
