// Credentialing workflow state machine
// Every transition is checked against the current step; rejected calls leave state untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::ProviderNumber;
use crate::workflows::outcome::ValidationOutcome;
use crate::workflows::record::ProviderRecord;
use crate::workflows::step::{Step, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    StartRetrieval,
    CompleteRetrieval,
    StartValidation,
    CompleteValidation,
    CreateWorkflow,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::StartRetrieval => "start retrieval",
            Operation::CompleteRetrieval => "complete retrieval",
            Operation::StartValidation => "start validation",
            Operation::CompleteValidation => "complete validation",
            Operation::CreateWorkflow => "create workflow",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepperError {
    #[error("cannot {operation} while {from}")]
    InvalidTransition { operation: Operation, from: Step },
    #[error("{operation} no longer applies to the current session")]
    StaleCompletion { operation: Operation },
}

/// Issued when a delayed operation starts; redeemed at most once when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTicket {
    generation: u64,
    sequence: u64,
    operation: Operation,
}

impl OperationTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTransition {
    pub from: Step,
    pub to: Step,
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
}

/// Which of the three user-facing operations may be triggered right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionFlags {
    pub retrieve: bool,
    pub validate: bool,
    pub create: bool,
}

/// Display status of the three workflow stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatuses {
    pub retrieve: StepStatus,
    pub validate: StepStatus,
    pub create: StepStatus,
}

/// Everything the display collaborator needs to render the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepperSnapshot {
    pub step: Step,
    pub provider_number: Option<ProviderNumber>,
    pub record: Option<ProviderRecord>,
    pub outcome: Option<ValidationOutcome>,
    pub actions: ActionFlags,
    pub stages: StageStatuses,
    pub generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowStepper {
    step: Step,
    provider_number: Option<ProviderNumber>,
    record: Option<ProviderRecord>,
    outcome: Option<ValidationOutcome>,
    generation: u64,
    issued: u64,
    outstanding: Option<OperationTicket>,
    allow_retry_from_error: bool,
    history: Vec<StepTransition>,
}

impl WorkflowStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `start_validation` from `error`.
    pub fn with_retry_from_error(mut self, allow: bool) -> Self {
        self.allow_retry_from_error = allow;
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn provider_number(&self) -> Option<&ProviderNumber> {
        self.provider_number.as_ref()
    }

    pub fn record(&self) -> Option<&ProviderRecord> {
        self.record.as_ref()
    }

    pub fn outcome(&self) -> Option<ValidationOutcome> {
        self.outcome
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn history(&self) -> &[StepTransition] {
        &self.history
    }

    pub fn allows_retry_from_error(&self) -> bool {
        self.allow_retry_from_error
    }

    pub fn status_of(&self, queried: Step) -> StepStatus {
        self.step.status_of(queried)
    }

    pub fn actions(&self) -> ActionFlags {
        ActionFlags {
            retrieve: self.step == Step::Idle,
            validate: self.can_start_validation(),
            create: self.step == Step::Validated,
        }
    }

    pub fn stages(&self) -> StageStatuses {
        StageStatuses {
            retrieve: self.status_of(Step::Retrieved),
            validate: self.status_of(Step::Validated),
            create: self.status_of(Step::WorkflowCreated),
        }
    }

    pub fn snapshot(&self) -> StepperSnapshot {
        StepperSnapshot {
            step: self.step,
            provider_number: self.provider_number.clone(),
            record: self.record.clone(),
            outcome: self.outcome,
            actions: self.actions(),
            stages: self.stages(),
            generation: self.generation,
        }
    }

    /// Record and outcome presence match the current step.
    pub fn invariants_hold(&self) -> bool {
        self.record.is_some() == self.step.holds_record()
            && self.outcome.is_some() == self.step.holds_outcome()
    }

    pub fn begin_retrieval(
        &mut self,
        provider_number: &ProviderNumber,
    ) -> Result<OperationTicket, StepperError> {
        self.require(Operation::StartRetrieval, self.step == Step::Idle)?;

        self.provider_number = Some(provider_number.clone());
        self.apply(Step::Retrieving, Operation::StartRetrieval);
        Ok(self.ticket(Operation::CompleteRetrieval))
    }

    pub fn complete_retrieval(
        &mut self,
        ticket: OperationTicket,
        record: ProviderRecord,
    ) -> Result<(), StepperError> {
        self.redeem(ticket, Operation::CompleteRetrieval)?;

        self.record = Some(record);
        self.apply(Step::Retrieved, Operation::CompleteRetrieval);
        Ok(())
    }

    pub fn begin_validation(&mut self) -> Result<OperationTicket, StepperError> {
        self.require(Operation::StartValidation, self.can_start_validation())?;

        self.outcome = None;
        self.apply(Step::Validating, Operation::StartValidation);
        Ok(self.ticket(Operation::CompleteValidation))
    }

    pub fn complete_validation(
        &mut self,
        ticket: OperationTicket,
        outcome: ValidationOutcome,
    ) -> Result<(), StepperError> {
        self.redeem(ticket, Operation::CompleteValidation)?;

        let next = if outcome.is_success() {
            Step::Validated
        } else {
            warn!(
                npi = ?self.provider_number.as_ref().map(ProviderNumber::as_str),
                reason = %outcome,
                "Provider data failed validation"
            );
            Step::Error
        };
        self.outcome = Some(outcome);
        self.apply(next, Operation::CompleteValidation);
        Ok(())
    }

    pub fn create_workflow(&mut self) -> Result<(), StepperError> {
        self.require(Operation::CreateWorkflow, self.step == Step::Validated)?;

        self.outcome = None;
        self.apply(Step::WorkflowCreated, Operation::CreateWorkflow);
        Ok(())
    }

    /// Back to `idle` with a new generation; outstanding tickets become stale.
    pub fn reset(&mut self) {
        let from = self.step;
        self.generation += 1;
        self.step = Step::Idle;
        self.outstanding = None;
        self.provider_number = None;
        self.record = None;
        self.outcome = None;
        self.history.clear();
        info!(
            from = %from,
            generation = self.generation,
            "Credentialing workflow reset"
        );
    }

    fn can_start_validation(&self) -> bool {
        self.step == Step::Retrieved || (self.allow_retry_from_error && self.step == Step::Error)
    }

    fn require(&self, operation: Operation, allowed: bool) -> Result<(), StepperError> {
        if allowed {
            return Ok(());
        }
        warn!(
            operation = %operation,
            step = %self.step,
            "Rejected workflow operation"
        );
        Err(StepperError::InvalidTransition {
            operation,
            from: self.step,
        })
    }

    /// Checks that `ticket` is the one outstanding completion, without spending it.
    pub fn accepts(&self, ticket: OperationTicket) -> Result<(), StepperError> {
        let expected = match ticket.operation {
            Operation::CompleteRetrieval => Step::Retrieving,
            Operation::CompleteValidation => Step::Validating,
            _ => {
                return Err(StepperError::StaleCompletion {
                    operation: ticket.operation,
                })
            }
        };

        if self.outstanding != Some(ticket)
            || ticket.generation != self.generation
            || self.step != expected
        {
            debug!(
                operation = %ticket.operation,
                ticket_generation = ticket.generation,
                ticket_sequence = ticket.sequence,
                generation = self.generation,
                step = %self.step,
                "Ignoring stale completion"
            );
            return Err(StepperError::StaleCompletion {
                operation: ticket.operation,
            });
        }
        Ok(())
    }

    fn redeem(
        &mut self,
        ticket: OperationTicket,
        operation: Operation,
    ) -> Result<(), StepperError> {
        if ticket.operation != operation {
            return Err(StepperError::StaleCompletion { operation });
        }
        self.accepts(ticket)?;
        self.outstanding = None;
        Ok(())
    }

    fn ticket(&mut self, operation: Operation) -> OperationTicket {
        self.issued += 1;
        let ticket = OperationTicket {
            generation: self.generation,
            sequence: self.issued,
            operation,
        };
        self.outstanding = Some(ticket);
        ticket
    }

    fn apply(&mut self, to: Step, operation: Operation) {
        let transition = StepTransition {
            from: self.step,
            to,
            operation,
            timestamp: Utc::now(),
        };

        info!(
            from = %transition.from,
            to = %transition.to,
            operation = %transition.operation,
            npi = ?self.provider_number.as_ref().map(ProviderNumber::as_str),
            "Credentialing workflow transition"
        );

        self.step = to;
        self.history.push(transition);
    }
}
