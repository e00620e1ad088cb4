//! Main binary entry point for the PMS Bridge Service

use anyhow::Context;
use pms_bridge::config::{BridgeConfig, ObservabilityConfig};
use pms_bridge::BridgeService;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env file: {}", e);
        }
    }

    // Configuration comes first: it selects the log level and format
    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.observability) {
        eprintln!("Failed to initialize tracing: {:#}", e);
        process::exit(1);
    }

    info!(
        "Starting PMS Bridge Service v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    log_configuration(&config);

    let service = match BridgeService::new(config) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize service: {}", e);
            process::exit(1);
        }
    };

    // Blocks until shutdown
    if let Err(e) = service.start().await {
        error!("Service error: {}", e);
        process::exit(1);
    }

    info!("PMS Bridge Service shutdown complete");
}

/// Initialize tracing/logging
fn init_tracing(observability: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("building log filter")?;

    match observability.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "pretty" | "text" => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false),
            )
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    }
    .context("installing global subscriber")?;

    Ok(())
}

fn log_configuration(config: &BridgeConfig) {
    info!(
        pms_root = %config.storage.pms_root.display(),
        "Tenant storage root"
    );
    info!(
        endpoint = %config.rgbridge.endpoint,
        max_retries = config.rgbridge.max_retries,
        retry_base_delay_ms = config.rgbridge.retry_base_delay_ms,
        "RGBridge delivery"
    );

    if config.rgbridge.username == "user" && config.rgbridge.password == "pass" {
        warn!("RGBridge credentials are the built-in defaults");
    }
    if !config.storage.pms_root.exists() {
        warn!("Tenant storage root does not exist yet; it is created on first deployment");
    }
}
