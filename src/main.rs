//! api-pipeline server binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_pipeline::config::Environment;
use api_pipeline::lifecycle::{start, StartupOptions};

#[derive(Parser, Debug)]
#[command(name = "api-pipeline", version, about = "HTTP API request pipeline")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "APP_CONFIG")]
    config: Option<PathBuf>,

    /// Deployment environment (`development` or `production`).
    #[arg(short, long, env = "APP_ENV")]
    environment: Option<Environment>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = StartupOptions {
        config_path: cli.config,
        environment: cli.environment,
    };

    match start(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be initialized if configuration failed.
            eprintln!("api-pipeline: {e}");
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
