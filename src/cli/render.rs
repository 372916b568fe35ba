// Terminal rendering of the portal screen and notifications

use crate::notifications::{Notification, NotificationKind};
use crate::workflows::{Step, StepStatus, StepperSnapshot};

fn stage_marker(status: StepStatus, in_flight: bool, failed: bool) -> &'static str {
    if failed {
        "❌"
    } else if in_flight {
        "⏳"
    } else {
        match status {
            StepStatus::Completed => "✅",
            StepStatus::Current => "👉",
            StepStatus::Pending => "⬜",
        }
    }
}

pub fn render_notification(notification: &Notification) -> String {
    let icon = match notification.kind {
        NotificationKind::Info => "🔔",
        NotificationKind::Success => "✅",
        NotificationKind::Destructive => "🚨",
    };
    match &notification.description {
        Some(description) => format!("{icon} {} {description}", notification.title),
        None => format!("{icon} {}", notification.title),
    }
}

pub fn render_snapshot(snapshot: &StepperSnapshot) -> String {
    let mut lines = Vec::new();

    let npi = snapshot
        .provider_number
        .as_ref()
        .map(|npi| npi.as_str())
        .unwrap_or("-");
    lines.push(format!("🛡️  CREDENTIALING PORTAL  (NPI: {npi})"));
    lines.push("═".repeat(38));

    let step = snapshot.step;
    let retrieve_label = match step {
        Step::Retrieving => "retrieving...".to_string(),
        _ => snapshot.stages.retrieve.to_string(),
    };
    let retrieve_marker = stage_marker(snapshot.stages.retrieve, step == Step::Retrieving, false);
    lines.push(format!("{retrieve_marker} Retrieve Data     {retrieve_label}"));

    let validate_label = match step {
        Step::Validating => "validating...".to_string(),
        Step::Error => "failed".to_string(),
        _ => snapshot.stages.validate.to_string(),
    };
    let validate_marker = stage_marker(
        snapshot.stages.validate,
        step == Step::Validating,
        step == Step::Error,
    );
    lines.push(format!("{validate_marker} Validate Data     {validate_label}"));
    lines.push(format!(
        "{} Create Workflow   {}",
        stage_marker(snapshot.stages.create, false, false),
        snapshot.stages.create
    ));

    if let Some(record) = &snapshot.record {
        lines.push(String::new());
        lines.push("📋 RETRIEVED DATA:".to_string());
        lines.push("──────────────────".to_string());
        lines.push(format!("   Name:                {}", record.full_name()));
        lines.push(format!("   Specialty:           {}", record.specialty));
        lines.push(format!("   License Number:      {}", record.license()));
        lines.push(format!("   DEA Number:          {}", record.dea_number));
        lines.push(format!("   Medical School:      {}", record.medical_school));
        lines.push(format!("   Residency:           {}", record.residency));
        lines.push(format!("   Board Certification: {}", record.board_certification));
        lines.push(format!("   Status:              {}", record.status));
        lines.push(format!("   Last Updated:        {}", record.last_updated));
    }

    if let Some(outcome) = snapshot.outcome {
        lines.push(String::new());
        if outcome.is_success() {
            lines.push("✅ Validation Successful".to_string());
            lines.push(
                "   Data validated successfully! Ready for credentialing workflow.".to_string(),
            );
        } else {
            lines.push("❌ Validation Failed".to_string());
            lines.push(format!("   {}", outcome.reason()));
        }
    }

    let mut actions = Vec::new();
    if snapshot.actions.retrieve {
        actions.push("retrieve");
    }
    if snapshot.actions.validate {
        actions.push("validate");
    }
    if snapshot.actions.create {
        actions.push("create");
    }
    lines.push(String::new());
    if actions.is_empty() {
        lines.push(format!("Step: {step} (no actions available)"));
    } else {
        lines.push(format!("Step: {step} (available: {})", actions.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ProviderNumber;
    use crate::workflows::{ProviderRecord, ValidationFailure, ValidationOutcome, WorkflowStepper};

    fn failed_snapshot() -> StepperSnapshot {
        let npi = ProviderNumber::parse("1234567890").unwrap();
        let mut stepper = WorkflowStepper::new();
        let ticket = stepper.begin_retrieval(&npi).unwrap();
        stepper.complete_retrieval(ticket, ProviderRecord::demo(&npi)).unwrap();
        let ticket = stepper.begin_validation().unwrap();
        stepper
            .complete_validation(ticket, ValidationOutcome::Failed(ValidationFailure::DataMismatch))
            .unwrap();
        stepper.snapshot()
    }

    #[test]
    fn test_idle_panel_offers_retrieval() {
        let panel = render_snapshot(&WorkflowStepper::new().snapshot());
        assert!(panel.contains("NPI: -"));
        assert!(panel.contains("⬜ Retrieve Data"));
        assert!(panel.contains("Step: idle (available: retrieve)"));
        assert!(!panel.contains("RETRIEVED DATA"));
    }

    #[test]
    fn test_in_flight_panel_labels() {
        let npi = ProviderNumber::parse("1234567890").unwrap();
        let mut stepper = WorkflowStepper::new();
        let ticket = stepper.begin_retrieval(&npi).unwrap();
        let panel = render_snapshot(&stepper.snapshot());
        assert!(panel.contains("⏳ Retrieve Data     retrieving..."));
        assert!(panel.contains("⬜ Validate Data     pending"));
        assert!(panel.lines().nth(1).is_some_and(|rule| rule.chars().count() == 38));

        stepper.complete_retrieval(ticket, ProviderRecord::demo(&npi)).unwrap();
        stepper.begin_validation().unwrap();
        let panel = render_snapshot(&stepper.snapshot());
        assert!(panel.contains("✅ Retrieve Data     completed"));
        assert!(panel.contains("⏳ Validate Data     validating..."));
    }

    #[test]
    fn test_failed_panel_shows_reason() {
        let panel = render_snapshot(&failed_snapshot());
        assert!(panel.contains("NPI: 1234567890"));
        assert!(panel.contains("✅ Retrieve Data"));
        assert!(panel.contains("❌ Validate Data"));
        assert!(panel.contains("Dr. Sarah Johnson"));
        assert!(panel.contains("CAQH data mismatch - manual review required"));
        assert!(panel.contains("Step: error (no actions available)"));
    }

    #[test]
    fn test_notification_line() {
        let line = render_notification(&Notification::validation_failed());
        assert_eq!(
            line,
            "🚨 Validation Failed Data mismatch detected. Manual review required."
        );
        assert_eq!(
            render_notification(&Notification::validation_started()),
            "🔔 Validating data..."
        );
    }
}
