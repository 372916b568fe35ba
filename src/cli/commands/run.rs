use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::commands::{build_driver, Command};
use crate::cli::render::{render_notification, render_snapshot};
use crate::notifications::{ChannelNotifier, Notification};
use crate::session::Portal;
use crate::shutdown::ShutdownCoordinator;
use crate::workflows::{StepperSnapshot, WorkflowSettings};

/// Signs in and walks the workflow from retrieval to creation without prompting.
pub struct RunCommand {
    pub npi: String,
    pub settings: WorkflowSettings,
    pub seed: Option<u64>,
    pub create: bool,
    pub json: bool,
}

impl RunCommand {
    pub fn new(npi: impl Into<String>, settings: WorkflowSettings) -> Self {
        Self {
            npi: npi.into(),
            settings,
            seed: None,
            create: true,
            json: false,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    async fn drive(
        &self,
        portal: &mut Portal,
        notifications: &mut UnboundedReceiver<Notification>,
    ) -> Result<StepperSnapshot> {
        let session = portal.login(&self.npi).await?;
        if !self.json {
            println!(
                "🔐 Signed in as NPI {} (session {})",
                session.provider_number, session.id
            );
            println!();
        }

        portal.retrieve().await?;
        portal.driver().wait_until_settled().await;
        self.drain(notifications);

        portal.validate().await?;
        portal.driver().wait_until_settled().await;
        // Completions notify while holding the state lock, so this also orders the drain.
        let snapshot = portal.snapshot().await;
        self.drain(notifications);

        if self.create && snapshot.actions.create {
            portal.create_workflow().await?;
            self.drain(notifications);
        }

        Ok(portal.snapshot().await)
    }

    fn drain(&self, notifications: &mut UnboundedReceiver<Notification>) {
        while let Ok(notification) = notifications.try_recv() {
            if !self.json {
                println!("{}", render_notification(&notification));
            }
        }
    }
}

impl Command for RunCommand {
    async fn execute(&self) -> Result<()> {
        let (notifier, mut notifications) = ChannelNotifier::new();
        let driver = build_driver(self.settings, self.seed, Arc::new(notifier));
        let shutdown = ShutdownCoordinator::new(driver.clone());
        let mut portal = Portal::new(driver);

        let snapshot = tokio::select! {
            result = self.drive(&mut portal, &mut notifications) => result?,
            signal = ShutdownCoordinator::wait_for_signal() => {
                signal?;
                shutdown.shutdown().await?;
                println!();
                println!("👋 Interrupted; pending workflow work cancelled");
                return Ok(());
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            println!();
            println!("{}", render_snapshot(&snapshot));
        }
        Ok(())
    }
}
