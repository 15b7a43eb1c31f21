use confique::Config;
use httpapi::InfoResponse;

/// Values served on `GET /v1/info`
#[derive(Debug, Config, Clone)]
pub struct InfoConfig {
    /// Public URL of this API
    #[config(env = "HTTPAPI_INFO_URL", default = "")]
    pub url: String,

    /// Version reported to clients, the package version when unset
    #[config(env = "HTTPAPI_INFO_VERSION")]
    pub version: Option<String>,

    /// Commit the binary was built from
    #[config(env = "HTTPAPI_INFO_COMMIT", default = "unknown")]
    pub commit: String,
}

impl From<&InfoConfig> for InfoResponse {
    fn from(config: &InfoConfig) -> Self {
        InfoResponse {
            url: config.url.clone(),
            version: config
                .version
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            commit: config.commit.clone(),
        }
    }
}
