//! telebridged - Vehicle telematics to MQTT bridge daemon
//!
//! Usage:
//!   telebridged [OPTIONS]
//!
//! Publishes the configured vehicle's diagnostics as Home Assistant
//! discovery entities and forwards command requests to the account API.
//! Without `--snapshot` (or an `[account]` section) the built-in sample
//! account is used.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use telebridge_core::mock::MockVehicleApi;
use telebridge_core::VehicleApi;
use telebridged::{AccountConfig, Args, Bridge, BridgeConfig, LogFormat};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "telebridged=info,telebridge_mqtt=info,telebridge_core=info";
const VERBOSE_FILTER: &str = "telebridged=debug,telebridge_mqtt=debug,telebridge_core=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args);

    tracing::info!("Starting telebridged");

    let config = BridgeConfig::from_args(&args)?;
    tracing::debug!(config = ?config.redacted(), "Configuration");

    let api = account_api(&config.account)?;
    let bridge = Bridge::new(config, api);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
        }
        let _ = shutdown_tx.send(true);
    });

    bridge.run(shutdown_rx).await
}

fn init_logging(args: &Args) {
    let default = if args.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());

    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

fn account_api(account: &AccountConfig) -> anyhow::Result<Arc<dyn VehicleApi>> {
    let api = match account {
        AccountConfig::Mock => {
            tracing::info!("Using the sample account");
            MockVehicleApi::sample()?
        }
        AccountConfig::Snapshot { path } => {
            tracing::info!("Loading account snapshot from: {}", path.display());
            MockVehicleApi::load(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?
        }
    };
    Ok(Arc::new(api))
}
