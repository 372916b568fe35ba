use anyhow::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::workflows::WorkflowDriver;

/// Cancels outstanding workflow work when the process is interrupted
pub struct ShutdownCoordinator {
    driver: WorkflowDriver,
}

impl ShutdownCoordinator {
    pub fn new(driver: WorkflowDriver) -> Self {
        Self { driver }
    }

    /// Wait for Ctrl-C
    pub async fn wait_for_signal() -> Result<()> {
        tokio::signal::ctrl_c().await?;
        info!("Received interrupt, shutting down");
        Ok(())
    }

    /// Reset the workflow so no scheduled transition outlives the session
    pub async fn shutdown(&self) -> Result<()> {
        if let Err(e) = timeout(Duration::from_secs(5), self.driver.reset()).await {
            warn!("Timed out cancelling pending workflow work: {}", e);
            return Err(anyhow::anyhow!("Timeout waiting for workflow reset"));
        }

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
