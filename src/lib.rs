// Certify Library - Provider Credentialing Workflow
// This exposes the core components for testing and integration

pub mod auth;
pub mod cli;
pub mod config;
pub mod notifications;
pub mod random;
pub mod session;
pub mod shutdown;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use auth::{sanitize_input, AuthError, ProviderNumber};
pub use config::{config, CertifyConfig};
pub use notifications::{
    ChannelNotifier, Notification, NotificationKind, Notifier, RecordingNotifier, TracingNotifier,
};
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use session::{Portal, Session, SessionError};
pub use shutdown::ShutdownCoordinator;
pub use telemetry::{
    create_workflow_span, generate_correlation_id, init_telemetry, shutdown_telemetry,
};
pub use workflows::{
    status_of, ActionFlags, ProviderRecord, Step, StepStatus, StepperError, StepperSnapshot,
    ValidationFailure, ValidationOutcome, WorkflowDriver, WorkflowSettings, WorkflowStepper,
};
