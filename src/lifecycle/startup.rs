//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration, then apply command-line overrides
//! - Initialize logging and metrics before anything else logs
//! - Bind the listener and serve until a termination signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;

use crate::config::{load_config, validate_config, ConfigError, Environment, PipelineConfig};
use crate::http::HttpServer;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

/// Fatal errors raised while starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Inputs gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub environment: Option<Environment>,
}

/// Build the effective configuration: file (or defaults) plus overrides.
pub fn resolve_config(options: &StartupOptions) -> Result<PipelineConfig, ServerError> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(environment) = options.environment {
        config.environment = environment;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Run the server to completion.
pub async fn start(options: StartupOptions) -> Result<(), ServerError> {
    let config = resolve_config(&options)?;

    logging::init_logging(&config.observability, config.environment);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        config_path = ?options.config_path,
        "api-pipeline starting"
    );

    if config.observability.metrics_enabled {
        // Validation has already checked this address.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    HttpServer::new(config)
        .run(listener, receiver)
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
