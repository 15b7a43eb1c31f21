mod config;
mod routes;

use crate::config::HttpApiConfig;
use httpapi::{InfoResponse, Server, ServerConfig, UaaClient};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match HttpApiConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let uaa = match UaaClient::new(
        &config.uaa.url,
        config.uaa.skip_ssl_validation,
        &config.uaa.client_id,
        &config.uaa.client_secret,
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create UAA client: {}", e);
            std::process::exit(1);
        }
    };

    let mut server_config = ServerConfig::new(Arc::new(uaa))
        .with_port(config.server.port)
        .with_hostname(config.server.hostname.clone())
        .with_templates_dir(&config.server.templates_dir)
        .with_introspection_timeout(config.server.introspection_timeout())
        .with_endpoints(routes::endpoints(InfoResponse::from(&config.info)));
    if let Some(assets_dir) = &config.server.assets_dir {
        server_config = server_config.with_assets_dir(assets_dir);
    }

    let server = match Server::new(server_config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.serve(shutdown_signal()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
