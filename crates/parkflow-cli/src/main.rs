//! ParkFlow - command-line client for the ParkFlow parking platform.
//!
//! Log in once, then check the wallet, manage vehicles, book spots and pay
//! for past sessions from the terminal.

mod commands;
mod prompt;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parkflow_core::{ApiClient, Config};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

/// Optional log file, in addition to stderr
const ENV_LOG_FILE: &str = "PARKFLOW_LOG_FILE";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_FILE) {
        Ok(path) if !path.trim().is_empty() => {
            let path = Path::new(&path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| "parkflow.log".as_ref());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Build the API client from configuration. Login redirects become a hint
/// on stderr; there is no login page to navigate to.
fn build_client(config: &Config) -> Result<ApiClient> {
    let tokens = config.token_store()?;
    let client = ApiClient::new(config.base_url(), tokens, config.request_timeout())
        .context("Failed to create HTTP client")?
        .with_navigator(Arc::new(|| {
            eprintln!("Your session has expired. Run `parkflow login` to sign in again.");
        }));
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if let Command::Help = command {
        println!("{}", commands::USAGE);
        return Ok(());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    info!(base_url = config.base_url(), backend = %config.token_backend, "ParkFlow starting");

    let client = build_client(&config)?;
    commands::run(command, &client, &mut config).await
}
