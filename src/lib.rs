//! Chain-head liveness watchdog.
//!
//! Periodically compares the block height reported by a locally running node
//! against an externally trusted reference source, and stops the node's
//! service when it falls out of sync or becomes unreachable so a standby
//! node can take over serving traffic.

pub mod config;
pub mod errors;
pub mod height;
pub mod monitor;
pub mod service;
