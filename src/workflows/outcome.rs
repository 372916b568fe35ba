use serde::{Deserialize, Serialize};
use std::fmt;

/// Why validation rejected the retrieved data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationFailure {
    /// CAQH and NPI registry data disagree.
    DataMismatch,
}

impl ValidationFailure {
    pub fn reason(self) -> &'static str {
        match self {
            ValidationFailure::DataMismatch => "CAQH data mismatch - manual review required",
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Result of the validation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "failure", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Success,
    Failed(ValidationFailure),
}

impl ValidationOutcome {
    /// Draws the outcome from a uniform sample in `[0, 1)`.
    ///
    /// Samples strictly above `failure_threshold` succeed.
    pub fn from_sample(sample: f64, failure_threshold: f64) -> Self {
        if sample > failure_threshold {
            ValidationOutcome::Success
        } else {
            ValidationOutcome::Failed(ValidationFailure::DataMismatch)
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ValidationOutcome::Success)
    }

    pub fn reason(self) -> &'static str {
        match self {
            ValidationOutcome::Success => "success",
            ValidationOutcome::Failed(failure) => failure.reason(),
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_threshold() {
        assert_eq!(ValidationOutcome::from_sample(0.5, 0.2), ValidationOutcome::Success);
        assert_eq!(
            ValidationOutcome::from_sample(0.1, 0.2),
            ValidationOutcome::Failed(ValidationFailure::DataMismatch)
        );
        // the threshold itself fails
        assert!(!ValidationOutcome::from_sample(0.2, 0.2).is_success());
    }

    #[test]
    fn test_failure_reason_text() {
        let outcome = ValidationOutcome::from_sample(0.0, 0.2);
        assert_eq!(outcome.reason(), "CAQH data mismatch - manual review required");
        assert_eq!(ValidationOutcome::Success.to_string(), "success");
    }
}
