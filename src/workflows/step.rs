use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress of the credentialing workflow. Exactly one step is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    #[default]
    Idle,
    Retrieving,
    Retrieved,
    Validating,
    Validated,
    Error,
    WorkflowCreated,
}

/// Display status of a step relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Current,
    Completed,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Idle,
        Step::Retrieving,
        Step::Retrieved,
        Step::Validating,
        Step::Validated,
        Step::Error,
        Step::WorkflowCreated,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Step::Idle => "idle",
            Step::Retrieving => "retrieving",
            Step::Retrieved => "retrieved",
            Step::Validating => "validating",
            Step::Validated => "validated",
            Step::Error => "error",
            Step::WorkflowCreated => "workflow-created",
        }
    }

    /// Every step visited on the way from `idle` to this one, inclusive.
    pub fn path(self) -> &'static [Step] {
        use Step::*;
        match self {
            Idle => &[Idle],
            Retrieving => &[Idle, Retrieving],
            Retrieved => &[Idle, Retrieving, Retrieved],
            Validating => &[Idle, Retrieving, Retrieved, Validating],
            Validated => &[Idle, Retrieving, Retrieved, Validating, Validated],
            Error => &[Idle, Retrieving, Retrieved, Validating, Error],
            WorkflowCreated => &[
                Idle,
                Retrieving,
                Retrieved,
                Validating,
                Validated,
                WorkflowCreated,
            ],
        }
    }

    /// The settled step an in-flight step is working towards.
    pub fn in_flight_target(self) -> Option<Step> {
        match self {
            Step::Retrieving => Some(Step::Retrieved),
            Step::Validating => Some(Step::Validated),
            _ => None,
        }
    }

    pub fn is_in_flight(self) -> bool {
        self.in_flight_target().is_some()
    }

    /// Whether a provider record must be present in this step.
    pub fn holds_record(self) -> bool {
        matches!(
            self,
            Step::Retrieved
                | Step::Validating
                | Step::Validated
                | Step::Error
                | Step::WorkflowCreated
        )
    }

    /// Whether a validation outcome must be present in this step.
    pub fn holds_outcome(self) -> bool {
        matches!(self, Step::Validated | Step::Error)
    }

    pub fn status_of(self, queried: Step) -> StepStatus {
        status_of(self, queried)
    }
}

/// Maps a queried step label to its display status given the current step.
///
/// Settled steps (`retrieved`, `validated`, `workflow-created`) read as
/// `current` while the operation producing them is in flight, and as
/// `completed` once the current step's path passes through them. `error` is
/// only ever `current` or `pending`.
pub fn status_of(current: Step, queried: Step) -> StepStatus {
    match queried {
        Step::Retrieved | Step::Validated | Step::WorkflowCreated => {
            if current.in_flight_target() == Some(queried) {
                StepStatus::Current
            } else if current.path().contains(&queried) {
                StepStatus::Completed
            } else {
                StepStatus::Pending
            }
        }
        Step::Error => {
            if current == Step::Error {
                StepStatus::Current
            } else {
                StepStatus::Pending
            }
        }
        Step::Idle | Step::Retrieving | Step::Validating => {
            if current == queried {
                StepStatus::Current
            } else if current.path().contains(&queried) {
                StepStatus::Completed
            } else {
                StepStatus::Pending
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepStatus::Pending => "pending",
            StepStatus::Current => "current",
            StepStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step label: {0}")]
pub struct UnknownStep(pub String);

impl FromStr for Step {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|step| step.label() == s)
            .ok_or_else(|| UnknownStep(s.to_string()))
    }
}
