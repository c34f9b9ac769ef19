use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hasslink::hub::ReqwestClient;
use hasslink::Config;
use hasslink::HubApi;
use hasslink::Registry;
use tracing_subscriber::filter::LevelFilter;

/// Create the controls listed in a config file on the hub.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    config: PathBuf,

    /// Log at debug level regardless of the config
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        config.logging.level.into()
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    tracing::info!("hasslink starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let client = ReqwestClient::from_config(&config.hub).context("building HTTP client")?;
    let hub = HubApi::new(client, &config.hub.url, &config.hub.token);

    let mut registry = Registry::new(hub, config.discovery.clone());
    if let Some(device) = config.device.clone() {
        registry.set_device(device.into());
    }

    for entry in &config.controls {
        let (params, kind) = entry.to_params();
        let handle = match registry.create(params, kind).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Skipping {}: {}", entry.object_id, e);
                continue;
            }
        };

        if let Some(state) = &entry.initial_state {
            if let Err(e) = registry.write(handle, state).await {
                tracing::warn!("Failed to set initial state of {}: {}", entry.object_id, e);
            }
        }
    }

    tracing::info!(
        "Created {} of {} controls",
        registry.len(),
        config.controls.len()
    );
    for control in registry.controls() {
        tracing::info!(
            "  {} ({}) state={:?}",
            control.entity_id(),
            if control.is_online() { "online" } else { "offline" },
            control.current_state()
        );
    }

    Ok(())
}
