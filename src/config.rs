//! Startup configuration: defaults, optional TOML config file, CLI overlay.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::height::DEFAULT_ORACLE_URL;

pub const DEFAULT_SLEEP_TIME_SECONDS: u64 = 10;
pub const DEFAULT_MAX_ORACLE_FAILURES: u32 = 10;
pub const DEFAULT_MAX_BLOCK_DIFFERENCE: i64 = 25;
pub const DEFAULT_RPC_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_SERVICE_NAME: &str = "erigon-rpc-daemon";

/// Monitors a node's chain head against a reference source and stops the
/// node's service when it falls out of sync, so a standby can take over.
#[derive(Debug, Parser)]
#[command(name = "watchdog")]
pub struct Cli {
    /// Optional TOML config file; CLI flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// The local node JSON-RPC endpoint to monitor
    #[arg(long)]
    pub rpc_endpoint: Option<String>,

    /// The reference block-explorer endpoint to compare against
    #[arg(long)]
    pub oracle_url: Option<String>,

    /// The time in seconds to sleep between each check cycle
    #[arg(long)]
    pub sleep_time: Option<u64>,

    /// The maximum number of times the oracle call can fail before we bail
    #[arg(long)]
    pub max_oracle_failures: Option<u32>,

    /// The maximum blocks difference the local node can have from the oracle
    /// before we bail
    #[arg(long)]
    pub max_block_difference: Option<i64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long)]
    pub rpc_timeout: Option<u64>,

    /// The systemd unit to stop when the node is judged out of sync
    #[arg(long)]
    pub service_name: Option<String>,
}

/// Config file shape; every field is optional so the file can override any
/// subset of the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub rpc_endpoint: Option<String>,
    pub oracle_url: Option<String>,
    pub sleep_time_seconds: Option<u64>,
    pub max_oracle_failures: Option<u32>,
    pub max_block_difference: Option<i64>,
    pub rpc_timeout_seconds: Option<u64>,
    pub service_name: Option<String>,
}

/// Resolved configuration, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_endpoint: String,
    pub oracle_url: String,
    pub sleep_time_seconds: u64,
    pub max_oracle_failures: u32,
    pub max_block_difference: i64,
    pub rpc_timeout_seconds: u64,
    pub service_name: String,
}

impl Config {
    /// Resolution order: defaults, then the config file, then CLI flags.
    pub fn resolve(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to load config from '{}'", path.display()))?;
                toml::from_str::<ConfigFile>(&raw)
                    .with_context(|| format!("Failed to parse config '{}'", path.display()))?
            }
            None => ConfigFile::default(),
        };

        let rpc_endpoint = cli
            .rpc_endpoint
            .or(file.rpc_endpoint)
            .ok_or_else(|| anyhow!("Missing required field: rpc_endpoint"))?;

        let config = Self {
            rpc_endpoint,
            oracle_url: cli
                .oracle_url
                .or(file.oracle_url)
                .unwrap_or_else(|| DEFAULT_ORACLE_URL.to_string()),
            sleep_time_seconds: cli
                .sleep_time
                .or(file.sleep_time_seconds)
                .unwrap_or(DEFAULT_SLEEP_TIME_SECONDS),
            max_oracle_failures: cli
                .max_oracle_failures
                .or(file.max_oracle_failures)
                .unwrap_or(DEFAULT_MAX_ORACLE_FAILURES),
            max_block_difference: cli
                .max_block_difference
                .or(file.max_block_difference)
                .unwrap_or(DEFAULT_MAX_BLOCK_DIFFERENCE),
            rpc_timeout_seconds: cli
                .rpc_timeout
                .or(file.rpc_timeout_seconds)
                .unwrap_or(DEFAULT_RPC_TIMEOUT_SECONDS),
            service_name: cli
                .service_name
                .or(file.service_name)
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_oracle_failures == 0 {
            bail!("Invalid value for 'max_oracle_failures': must be at least 1");
        }
        if self.max_block_difference < 0 {
            bail!("Invalid value for 'max_block_difference': must not be negative");
        }
        if self.rpc_timeout_seconds == 0 {
            bail!("Invalid value for 'rpc_timeout_seconds': must be at least 1");
        }
        Ok(())
    }
}
