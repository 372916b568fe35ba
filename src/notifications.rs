//! Transient, fire-and-forget notifications emitted on workflow transitions.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            kind: NotificationKind::Info,
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            kind: NotificationKind::Success,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            kind: NotificationKind::Destructive,
        }
    }

    pub fn retrieval_started() -> Self {
        Self::info("Retrieving CAQH and NPI data...")
    }

    pub fn retrieval_succeeded() -> Self {
        Self::success("Success!", "CAQH and NPI data retrieved successfully")
    }

    pub fn validation_started() -> Self {
        Self::info("Validating data...")
    }

    pub fn validation_succeeded() -> Self {
        Self::success(
            "Validation Successful!",
            "Data validated successfully! Ready for credentialing workflow.",
        )
    }

    pub fn validation_failed() -> Self {
        Self::destructive(
            "Validation Failed",
            "Data mismatch detected. Manual review required.",
        )
    }

    pub fn workflow_created() -> Self {
        Self::success(
            "Credentialing Workflow Created!",
            "Your credentialing workflow is ready to be triggered.",
        )
    }
}

/// Display collaborator for notifications. Delivery is best effort.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Destructive => warn!(
                title = %notification.title,
                description = ?notification.description,
                "Notification"
            ),
            _ => info!(
                title = %notification.title,
                description = ?notification.description,
                "Notification"
            ),
        }
    }
}

/// Forwards notifications into an unbounded channel for a front end to drain.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.notifications().into_iter().map(|n| n.title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        match self.seen.lock() {
            Ok(mut seen) => seen.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
