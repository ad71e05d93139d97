//! Stepform - Entry point
//!
//! Loads configuration, builds the logger and the in-memory store, then
//! serves the API until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use stepform::{seed_user, App, InMemoryStore};
use stepform_config::{ConfigLoader, DEFAULT_CONFIG_FILE, DEFAULT_ENV_PREFIX, SECRET_ENV_VAR};
use stepform_server::{Server, ServerConfig};
use stepform_telemetry::build_logger;
use tracing::info;

const SEED_USER_VAR: &str = "STEPFORM_SEED_USER";
const SEED_PASSWORD_VAR: &str = "STEPFORM_SEED_PASSWORD";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("stepform {}", stepform::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Stepform - forms and steps API

USAGE:
    stepform [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (YAML, TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

Without --config, server.cfg.yaml is read from the working directory if present.

ENVIRONMENT VARIABLES:
    JWT_SECRET_KEY                      Token signing secret (required)
    STEPFORM__SERVER__HOST              Interface to bind (default: 0.0.0.0)
    STEPFORM__SERVER__PORT              Port to bind (default: 8080)
    STEPFORM__SERVER__BASE_URL          API route prefix (default: /api/v1)
    STEPFORM__SERVER__PUBLIC_URL        Origin used in resource links
    STEPFORM__LOG__LEVEL                Minimum log level (default: info)
    STEPFORM__AUTH__TOKEN_TTL_SECS      Token lifetime (default: 3600)
    STEPFORM_SEED_USER                  Username registered at startup
    STEPFORM_SEED_PASSWORD              Password of the seed user

A .env file in the working directory is loaded first.
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new().with_dotenv()?;
    let loader = match &args.config {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    let config = loader
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .with_secret_from_env(SECRET_ENV_VAR)
        .load()
        .context("failed to load configuration")?;

    let logger = build_logger(&config.log.to_log_config()).context("failed to build logger")?;
    logger
        .install_as_process_default()
        .context("failed to install logger")?;
    info!(log_level = %config.log.level, "Initialized logger");

    let store = Arc::new(InMemoryStore::new());
    if let (Ok(username), Ok(password)) = (
        std::env::var(SEED_USER_VAR),
        std::env::var(SEED_PASSWORD_VAR),
    ) {
        seed_user(&store, &username, &password)?;
        info!(%username, "Seed user registered");
    }

    let app = App::from_config(&config, store, logger);

    let server_config = ServerConfig::new(config.server.http_addr())
        .with_shutdown_timeout(config.server.shutdown_timeout())
        .with_request_timeout(config.server.request_timeout());

    info!(
        version = stepform::VERSION,
        addr = %server_config.http_addr(),
        base_url = %config.server.base_url,
        "Starting stepform"
    );

    Server::new(server_config, app).run().await?;

    info!("Server stopped");
    Ok(())
}
