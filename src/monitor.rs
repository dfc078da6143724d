//! The decision loop: polls both height sources each cycle, applies the
//! staleness policy and engages the shutdown action exactly once on exit.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::errors::FetchError;
use crate::height::Height;

/// One height source as seen by the decision loop.
#[allow(async_fn_in_trait)]
pub trait HeightSource {
    async fn height(&self) -> Result<Height, FetchError>;
}

/// Best-effort remedial action that stops the watched service. The loop
/// logs the outcome but halts regardless of it.
#[allow(async_fn_in_trait)]
pub trait ShutdownAction {
    async fn engage(&self) -> anyhow::Result<()>;
}

/// Immutable policy applied each cycle.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Pause between check cycles.
    pub sleep_time: Duration,
    /// Consecutive oracle failures tolerated before the service is stopped.
    pub max_oracle_failures: u32,
    /// Maximum blocks the local node may trail the oracle.
    pub max_block_difference: i64,
}

/// Why the loop reached its terminal state. Every reason except `Cancelled`
/// means the shutdown action was engaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The local node did not answer its height query.
    LocalUnreachable,
    /// The oracle failed for `max_oracle_failures` consecutive cycles.
    OracleFailuresExhausted,
    /// The local node trails the oracle by more than the tolerated diff.
    FellBehind {
        local: Height,
        oracle: Height,
        diff: i64,
    },
    /// The stop signal was raised; no stop condition fired.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::LocalUnreachable => write!(f, "local node unreachable"),
            StopReason::OracleFailuresExhausted => {
                write!(f, "oracle failed too many consecutive times")
            }
            StopReason::FellBehind {
                local,
                oracle,
                diff,
            } => write!(
                f,
                "local node fell behind (local {}, oracle {}, diff {})",
                local, oracle, diff
            ),
            StopReason::Cancelled => write!(f, "stop requested"),
        }
    }
}

/// The watchdog loop. Owns the consecutive-oracle-failure counter; nothing
/// else reads or mutates it.
pub struct Watchdog<L, O, A> {
    policy: Policy,
    local: L,
    oracle: O,
    action: A,
    stop: watch::Receiver<bool>,
    consecutive_oracle_failures: u32,
}

impl<L, O, A> Watchdog<L, O, A>
where
    L: HeightSource,
    O: HeightSource,
    A: ShutdownAction,
{
    pub fn new(policy: Policy, local: L, oracle: O, action: A, stop: watch::Receiver<bool>) -> Self {
        Self {
            policy,
            local,
            oracle,
            action,
            stop,
            consecutive_oracle_failures: 0,
        }
    }

    /// Runs check cycles until one of the stop conditions fires or the stop
    /// signal is raised. The local fetch runs first; the oracle is only
    /// queried once the local node has answered.
    pub async fn run(mut self) -> StopReason {
        loop {
            if *self.stop.borrow() {
                info!("Stop requested, watchdog exiting");
                return StopReason::Cancelled;
            }

            let local_height = match self.local.height().await {
                Ok(height) => height,
                Err(e) => {
                    error!(
                        "Failed to get block number from local rpc due to {}. Stopping service ...",
                        e
                    );
                    self.engage_shutdown().await;
                    return StopReason::LocalUnreachable;
                }
            };

            match self.oracle.height().await {
                Err(e) => {
                    self.consecutive_oracle_failures += 1;
                    if self.consecutive_oracle_failures >= self.policy.max_oracle_failures {
                        error!(
                            "Failed to get block number from oracle due to {} for {} subsequent times. Stopping service just to be safe ...",
                            e, self.consecutive_oracle_failures
                        );
                        self.engage_shutdown().await;
                        return StopReason::OracleFailuresExhausted;
                    }
                    // No reference value this round, so no divergence check.
                    error!("Failed to get block number from oracle due to {}", e);
                }
                Ok(oracle_height) => {
                    self.consecutive_oracle_failures = 0;
                    let diff = oracle_height as i64 - local_height as i64;
                    if diff > self.policy.max_block_difference {
                        error!(
                            "Local block number: {}, Oracle block number: {}. Diff: {} > {}. Stopping service ...",
                            local_height, oracle_height, diff, self.policy.max_block_difference
                        );
                        self.engage_shutdown().await;
                        return StopReason::FellBehind {
                            local: local_height,
                            oracle: oracle_height,
                            diff,
                        };
                    }
                    info!(
                        "Local block number: {}, Oracle block number: {}. Diff: {}. All good.",
                        local_height, oracle_height, diff
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.policy.sleep_time) => {}
                _ = self.stop.changed() => {
                    info!("Stop requested, watchdog exiting");
                    return StopReason::Cancelled;
                }
            }
        }
    }

    async fn engage_shutdown(&self) {
        match self.action.engage().await {
            Ok(()) => info!("Shutdown action completed"),
            Err(e) => error!("Shutdown action failed: {}", e),
        }
    }
}
