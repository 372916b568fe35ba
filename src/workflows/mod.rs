// Credentialing workflow: step model, state machine and timer-driven driver

pub mod driver;
pub mod outcome;
pub mod record;
pub mod state_machine;
pub mod step;

pub use driver::{WorkflowDriver, WorkflowSettings};
pub use outcome::{ValidationFailure, ValidationOutcome};
pub use record::ProviderRecord;
pub use state_machine::{
    ActionFlags, Operation, OperationTicket, StageStatuses, StepTransition, StepperError,
    StepperSnapshot, WorkflowStepper,
};
pub use step::{status_of, Step, StepStatus};
