//! vatrigger - Video Analytics Trigger
//!
//! A CLI tool that asks the photo service to start (or stop, or report on)
//! server-side video analytics and relays the outcome as timestamped
//! status lines.
//!
//! Exit codes:
//!   0 - Both notifications delivered (including a failure notification)
//!   1 - Setup error (arguments, config, HTTP client) or the run ended early

mod cli;
mod config;
mod error;
mod models;
mod trigger;

use anyhow::{bail, Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{AnalyticsRequest, Notification};
use trigger::{AnalyticsTrigger, HttpTransport};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("vatrigger v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_trigger(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Trigger failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .vatrigger.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr; stdout carries only notifications.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Fire one request and print its notifications. Returns the exit code.
async fn run_trigger(args: Args) -> Result<i32> {
    let mut config = Config::resolve(args.config.as_deref(), Path::new("."))?;
    config.merge_with_args(&args);

    // Values from the config file skip CLI validation.
    if let Err(e) = cli::validate_base_url(&config.server.base_url) {
        bail!(e);
    }

    let transport = HttpTransport::new(&config.server.base_url, config.server.timeout_seconds)?;
    let request = AnalyticsRequest::new(&config.request.path, config.request.action);
    let trigger = AnalyticsTrigger::new(transport, request, config.notify.time_format.clone())?;

    debug!("Request body: {}", trigger.request().body());

    let mut notifications = trigger.run();
    let mut got_outcome = false;
    while let Some(notification) = notifications.recv().await {
        print_notification(&notification, args.format)?;
        got_outcome |= notification.is_outcome();
    }

    if !got_outcome {
        warn!("Run ended before the server answered");
        return Ok(1);
    }

    Ok(0)
}

fn print_notification(notification: &Notification, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", notification),
        OutputFormat::Json => {
            let line =
                serde_json::to_string(notification).context("Failed to serialize notification")?;
            println!("{}", line);
        }
    }
    Ok(())
}
