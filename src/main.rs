use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use watchdog::config::{Cli, Config};
use watchdog::height::{HeightClient, HeightQuery, RemoteHeightSource};
use watchdog::monitor::{Policy, Watchdog};
use watchdog::service::SystemdStopper;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::from_default_env()
        .add_directive("watchdog=debug".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    let config = Config::resolve(cli)?;

    info!("Starting chain-head watchdog for {}", config.rpc_endpoint);
    info!(
        "Checking against {} every {}s (max block difference {}, max oracle failures {})",
        config.oracle_url,
        config.sleep_time_seconds,
        config.max_block_difference,
        config.max_oracle_failures
    );

    let client = HeightClient::new(Duration::from_secs(config.rpc_timeout_seconds))?;
    let local = RemoteHeightSource::new(
        client.clone(),
        HeightQuery::local_node(&config.rpc_endpoint),
    );
    let oracle = RemoteHeightSource::new(client, HeightQuery::oracle(&config.oracle_url));
    let stopper = SystemdStopper::new(&config.service_name);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for interrupt signal: {}", e);
            return;
        }
        info!("Received interrupt, stopping watchdog");
        let _ = stop_tx.send(true);
    });

    let policy = Policy {
        sleep_time: Duration::from_secs(config.sleep_time_seconds),
        max_oracle_failures: config.max_oracle_failures,
        max_block_difference: config.max_block_difference,
    };

    let reason = Watchdog::new(policy, local, oracle, stopper, stop_rx)
        .run()
        .await;

    // Same exit code for every terminal trigger; the log line tells them apart.
    info!("Watchdog exited: {}", reason);
    Ok(())
}
