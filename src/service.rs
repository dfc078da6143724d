//! Shutdown action: stops the watched node's systemd unit.

use anyhow::{anyhow, Result};
use tokio::process::Command as AsyncCommand;
use tracing::info;

use crate::monitor::ShutdownAction;

/// Stops a systemd service with `systemctl stop`. The unit name is
/// configurable per deployment.
#[derive(Debug, Clone)]
pub struct SystemdStopper {
    service_name: String,
}

impl SystemdStopper {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl ShutdownAction for SystemdStopper {
    async fn engage(&self) -> Result<()> {
        info!("Stopping service: {}", self.service_name);

        let output = AsyncCommand::new("systemctl")
            .arg("stop")
            .arg(&self.service_name)
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Failed to stop service {}: {}",
                self.service_name,
                error
            ));
        }

        info!("Service {} stopped successfully", self.service_name);
        Ok(())
    }
}
