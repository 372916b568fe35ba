//! Asynchronous driver for the credentialing workflow.
//!
//! Retrieval and validation complete after a fixed delay on a spawned task.
//! At most one such task is outstanding because each start operation is gated
//! on the current step. Resetting aborts the outstanding task, and the
//! stepper's ticket check discards its completion should it fire anyway.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, Instrument};

use crate::auth::ProviderNumber;
use crate::config::WorkflowConfig;
use crate::notifications::{Notification, Notifier, TracingNotifier};
use crate::random::{RandomSource, ThreadRandom};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflows::outcome::ValidationOutcome;
use crate::workflows::record::ProviderRecord;
use crate::workflows::state_machine::{
    OperationTicket, StepTransition, StepperError, StepperSnapshot, WorkflowStepper,
};
use crate::workflows::step::{Step, StepStatus};

pub const DEFAULT_RETRIEVAL_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_VALIDATION_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowSettings {
    pub retrieval_delay: Duration,
    pub validation_delay: Duration,
    /// Validation samples at or below this value fail.
    pub failure_threshold: f64,
    pub allow_retry_from_error: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            retrieval_delay: DEFAULT_RETRIEVAL_DELAY,
            validation_delay: DEFAULT_VALIDATION_DELAY,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            allow_retry_from_error: false,
        }
    }
}

impl From<&WorkflowConfig> for WorkflowSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            retrieval_delay: Duration::from_millis(config.retrieval_delay_ms),
            validation_delay: Duration::from_millis(config.validation_delay_ms),
            failure_threshold: config.failure_threshold,
            allow_retry_from_error: config.allow_retry_from_error,
        }
    }
}

#[derive(Debug)]
struct PendingCompletion {
    ticket: OperationTicket,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct DriverState {
    stepper: WorkflowStepper,
    pending: Option<PendingCompletion>,
}

struct DriverInner {
    state: Mutex<DriverState>,
    random: Arc<dyn RandomSource>,
    notifier: Arc<dyn Notifier>,
    settings: WorkflowSettings,
    snapshots: watch::Sender<StepperSnapshot>,
}

/// Owns the stepper and schedules its delayed transitions.
#[derive(Clone)]
pub struct WorkflowDriver {
    inner: Arc<DriverInner>,
}

impl std::fmt::Debug for WorkflowDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDriver")
            .field("settings", &self.inner.settings)
            .field("snapshot", &*self.inner.snapshots.borrow())
            .finish()
    }
}

impl WorkflowDriver {
    pub fn new(
        settings: WorkflowSettings,
        random: Arc<dyn RandomSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let stepper = WorkflowStepper::new().with_retry_from_error(settings.allow_retry_from_error);
        let (snapshots, _) = watch::channel(stepper.snapshot());

        Self {
            inner: Arc::new(DriverInner {
                state: Mutex::new(DriverState {
                    stepper,
                    pending: None,
                }),
                random,
                notifier,
                settings,
                snapshots,
            }),
        }
    }

    /// Thread-local randomness and log-only notifications.
    pub fn with_defaults(settings: WorkflowSettings) -> Self {
        Self::new(settings, Arc::new(ThreadRandom), Arc::new(TracingNotifier))
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.inner.settings
    }

    pub async fn start_retrieval(
        &self,
        provider_number: &ProviderNumber,
    ) -> Result<(), StepperError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(
            "retrieval",
            Some(provider_number.as_str()),
            Some(correlation_id.as_str()),
        );
        let mut state = self.inner.state.lock().await;

        let ticket = state.stepper.begin_retrieval(provider_number)?;
        self.inner.publish(&state.stepper);
        self.inner.notifier.notify(Notification::retrieval_started());

        let inner = Arc::clone(&self.inner);
        let record = ProviderRecord::demo(provider_number);
        let delay = self.inner.settings.retrieval_delay;
        let handle = tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                inner.finish_retrieval(ticket, record).await;
            }
            .instrument(span),
        );

        state.pending = Some(PendingCompletion { ticket, handle });
        Ok(())
    }

    pub async fn start_validation(&self) -> Result<(), StepperError> {
        let mut state = self.inner.state.lock().await;
        let npi = state
            .stepper
            .provider_number()
            .map(|npi| npi.as_str().to_string());
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(
            "validation",
            npi.as_deref(),
            Some(correlation_id.as_str()),
        );

        let ticket = state.stepper.begin_validation()?;
        self.inner.publish(&state.stepper);
        self.inner.notifier.notify(Notification::validation_started());

        let inner = Arc::clone(&self.inner);
        let delay = self.inner.settings.validation_delay;
        let handle = tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                inner.finish_validation(ticket).await;
            }
            .instrument(span),
        );

        state.pending = Some(PendingCompletion { ticket, handle });
        Ok(())
    }

    pub async fn create_workflow(&self) -> Result<(), StepperError> {
        let mut state = self.inner.state.lock().await;

        state.stepper.create_workflow()?;
        self.inner.publish(&state.stepper);
        self.inner.notifier.notify(Notification::workflow_created());
        Ok(())
    }

    /// Cancels any outstanding operation and returns to `idle`.
    pub async fn reset(&self) {
        let mut state = self.inner.state.lock().await;

        if let Some(pending) = state.pending.take() {
            pending.handle.abort();
            debug!(
                operation = %pending.ticket.operation(),
                generation = pending.ticket.generation(),
                "Cancelled pending workflow operation"
            );
        }
        state.stepper.reset();
        self.inner.publish(&state.stepper);
    }

    pub async fn snapshot(&self) -> StepperSnapshot {
        self.inner.state.lock().await.stepper.snapshot()
    }

    pub async fn step(&self) -> Step {
        self.inner.state.lock().await.stepper.step()
    }

    pub async fn status_of(&self, queried: Step) -> StepStatus {
        self.inner.state.lock().await.stepper.status_of(queried)
    }

    pub async fn history(&self) -> Vec<StepTransition> {
        self.inner.state.lock().await.stepper.history().to_vec()
    }

    pub async fn has_pending_operation(&self) -> bool {
        self.inner.state.lock().await.pending.is_some()
    }

    /// Receives a snapshot after every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<StepperSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Waits until no retrieval or validation is in flight.
    pub async fn wait_until_settled(&self) -> StepperSnapshot {
        let mut snapshots = self.subscribe();
        let settled = snapshots
            .wait_for(|snapshot| !snapshot.step.is_in_flight())
            .await
            .map(|snapshot| snapshot.clone());

        match settled {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot().await,
        }
    }
}

impl DriverInner {
    fn publish(&self, stepper: &WorkflowStepper) {
        self.snapshots.send_replace(stepper.snapshot());
    }

    fn clear_pending(state: &mut DriverState, ticket: OperationTicket) {
        if state.pending.as_ref().map(|pending| pending.ticket) == Some(ticket) {
            state.pending = None;
        }
    }

    async fn finish_retrieval(&self, ticket: OperationTicket, record: ProviderRecord) {
        let mut state = self.state.lock().await;
        Self::clear_pending(&mut state, ticket);

        match state.stepper.complete_retrieval(ticket, record) {
            Ok(()) => {
                self.publish(&state.stepper);
                self.notifier.notify(Notification::retrieval_succeeded());
            }
            Err(e) => debug!(error = %e, "Discarded retrieval completion"),
        }
    }

    async fn finish_validation(&self, ticket: OperationTicket) {
        let mut state = self.state.lock().await;
        Self::clear_pending(&mut state, ticket);

        if let Err(e) = state.stepper.accepts(ticket) {
            debug!(error = %e, "Discarded validation completion");
            return;
        }

        let sample = self.random.next_f64();
        let threshold = self.settings.failure_threshold;
        let outcome = ValidationOutcome::from_sample(sample, threshold);
        debug!(sample, threshold, "Validation sample drawn");

        match state.stepper.complete_validation(ticket, outcome) {
            Ok(()) => {
                self.publish(&state.stepper);
                let notification = if outcome.is_success() {
                    Notification::validation_succeeded()
                } else {
                    Notification::validation_failed()
                };
                self.notifier.notify(notification);
            }
            Err(e) => debug!(error = %e, "Discarded validation completion"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::RecordingNotifier;
    use crate::random::FixedRandom;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn npi() -> ProviderNumber {
        ProviderNumber::parse("1234567890").unwrap()
    }

    fn build_driver(sample: f64) -> (WorkflowDriver, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let driver = WorkflowDriver::new(
            WorkflowSettings::default(),
            Arc::new(FixedRandom(sample)),
            notifier.clone(),
        );
        (driver, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieval_completes_after_delay() {
        let (driver, notifier) = build_driver(0.5);
        driver.start_retrieval(&npi()).await.unwrap();

        assert_eq!(driver.step().await, Step::Retrieving);
        assert_ne!(driver.status_of(Step::Retrieved).await, StepStatus::Completed);
        assert!(driver.has_pending_operation().await);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(driver.step().await, Step::Retrieving);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let snapshot = driver.snapshot().await;
        assert_eq!(snapshot.step, Step::Retrieved);
        assert_eq!(snapshot.record.map(|r| r.npi), Some(npi()));
        assert!(!driver.has_pending_operation().await);
        assert_eq!(
            notifier.titles(),
            vec!["Retrieving CAQH and NPI data...", "Success!"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_outcome_follows_random_source() {
        let (driver, notifier) = build_driver(0.5);
        driver.start_retrieval(&npi()).await.unwrap();
        driver.wait_until_settled().await;
        driver.start_validation().await.unwrap();
        let snapshot = driver.wait_until_settled().await;

        assert_eq!(snapshot.step, Step::Validated);
        assert_eq!(snapshot.outcome, Some(ValidationOutcome::Success));
        assert_eq!(notifier.titles().last().map(String::as_str), Some("Validation Successful!"));

        let (driver, notifier) = build_driver(0.1);
        driver.start_retrieval(&npi()).await.unwrap();
        driver.wait_until_settled().await;
        driver.start_validation().await.unwrap();
        let snapshot = driver.wait_until_settled().await;

        assert_eq!(snapshot.step, Step::Error);
        assert_eq!(
            snapshot.outcome.map(|o| o.reason()),
            Some("CAQH data mismatch - manual review required")
        );
        assert_eq!(notifier.titles().last().map(String::as_str), Some("Validation Failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_retrieval() {
        let (driver, notifier) = build_driver(0.5);
        driver.start_retrieval(&npi()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        driver.reset().await;
        assert!(!driver.has_pending_operation().await);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        let snapshot = driver.snapshot().await;
        assert_eq!(snapshot.step, Step::Idle);
        assert!(snapshot.record.is_none());
        assert_eq!(notifier.titles(), vec!["Retrieving CAQH and NPI data..."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_validation() {
        let (driver, _notifier) = build_driver(0.5);
        driver.start_retrieval(&npi()).await.unwrap();
        driver.wait_until_settled().await;
        driver.start_validation().await.unwrap();

        driver.reset().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;

        let snapshot = driver.snapshot().await;
        assert_eq!(snapshot.step, Step::Idle);
        assert!(snapshot.outcome.is_none());
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_workflow_only_after_validation() {
        let (driver, notifier) = build_driver(0.9);
        assert!(driver.create_workflow().await.is_err());

        driver.start_retrieval(&npi()).await.unwrap();
        assert!(driver.create_workflow().await.is_err());
        driver.wait_until_settled().await;
        driver.start_validation().await.unwrap();
        driver.wait_until_settled().await;

        driver.create_workflow().await.unwrap();
        assert_eq!(driver.step().await, Step::WorkflowCreated);
        assert_eq!(
            notifier.titles().last().map(String::as_str),
            Some("Credentialing Workflow Created!")
        );
    }

    #[derive(Default)]
    struct CountingRandom {
        draws: AtomicUsize,
    }

    impl RandomSource for CountingRandom {
        fn next_f64(&self) -> f64 {
            self.draws.fetch_add(1, Ordering::SeqCst);
            0.5
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_validation_draws_no_sample() {
        let random = Arc::new(CountingRandom::default());
        let driver = WorkflowDriver::new(
            WorkflowSettings::default(),
            random.clone(),
            Arc::new(RecordingNotifier::new()),
        );
        driver.start_retrieval(&npi()).await.unwrap();
        driver.wait_until_settled().await;
        driver.start_validation().await.unwrap();

        let stale = driver
            .inner
            .state
            .lock()
            .await
            .pending
            .as_ref()
            .map(|pending| pending.ticket)
            .unwrap();
        driver.reset().await;
        driver.inner.finish_validation(stale).await;
        assert_eq!(random.draws.load(Ordering::SeqCst), 0);
        assert_eq!(driver.step().await, Step::Idle);

        driver.start_retrieval(&npi()).await.unwrap();
        driver.wait_until_settled().await;
        driver.start_validation().await.unwrap();
        assert_eq!(driver.wait_until_settled().await.step, Step::Validated);
        assert_eq!(random.draws.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_transitions() {
        let (driver, _notifier) = build_driver(0.5);
        let mut snapshots = driver.subscribe();
        assert_eq!(snapshots.borrow().step, Step::Idle);

        driver.start_retrieval(&npi()).await.unwrap();
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow_and_update().step, Step::Retrieving);

        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow_and_update().step, Step::Retrieved);
    }
}
