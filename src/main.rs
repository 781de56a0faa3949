use oralab::config;
use oralab::server;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    // Configuration path from the first argument, with a conventional default
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(String::as_str).unwrap_or("oralab.toml");

    let config = match config::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        db = %config.database.connect_string,
        schema = %config.database.sample_schema,
        "Starting oralab..."
    );

    let driver = match build_driver(&config) {
        Ok(driver) => driver,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server::serve(&config, driver).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "oracle")]
fn build_driver(
    config: &config::Config,
) -> Result<Arc<dyn oralab::core::db::Driver>, String> {
    use oralab::core::db::oracle::OracleDriver;

    Ok(Arc::new(OracleDriver::new(
        config.database.connect_string.clone(),
        config.database.user.clone(),
        config.database.password.clone(),
    )))
}

#[cfg(not(feature = "oracle"))]
fn build_driver(
    _config: &config::Config,
) -> Result<Arc<dyn oralab::core::db::Driver>, String> {
    Err("This build has no database backend; rebuild with `--features oracle`.".to_string())
}
