use crate::config::info::InfoConfig;
use crate::config::server::ServerSection;
use crate::config::uaa::UaaConfig;
use confique::Config;
use std::path::Path;

pub mod info;
pub mod server;
pub mod uaa;

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "HTTPAPI_CONFIG_FILE";

/// Top-level configuration for the httpapi server.
///
/// Values come from `HTTPAPI_*` environment variables first, then from the
/// TOML file named by `HTTPAPI_CONFIG_FILE`, then from the defaults.
#[derive(Debug, Config, Clone)]
pub struct HttpApiConfig {
    #[config(nested)]
    pub server: ServerSection,

    #[config(nested)]
    pub uaa: UaaConfig,

    #[config(nested)]
    pub info: InfoConfig,
}

impl HttpApiConfig {
    pub fn new() -> Result<Self, confique::Error> {
        let file = std::env::var_os(CONFIG_FILE_ENV);
        Self::load_from(file.as_deref().map(Path::new))
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self, confique::Error> {
        let mut builder = Self::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        builder.load()
    }
}
