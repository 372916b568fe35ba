use anyhow::Result;
use std::sync::Arc;

use crate::notifications::Notifier;
use crate::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::workflows::{WorkflowDriver, WorkflowSettings};

pub mod check;
pub mod run;
pub mod shell;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Seeded when reproducibility is requested, thread randomness otherwise.
pub fn random_source(seed: Option<u64>) -> Arc<dyn RandomSource> {
    match seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    }
}

pub fn build_driver(
    settings: WorkflowSettings,
    seed: Option<u64>,
    notifier: Arc<dyn Notifier>,
) -> WorkflowDriver {
    WorkflowDriver::new(settings, random_source(seed), notifier)
}

pub async fn show_how_to_start() -> Result<()> {
    println!("🛡️  Certify - Provider Credentialing Workflow");
    println!();
    println!("Sign in with your 10-digit National Provider Identifier (NPI) to begin.");
    println!();
    println!("To get started:");
    println!("  🔎 certify check <NPI>    # Check that your NPI is accepted");
    println!("  🚀 certify run <NPI>      # Run retrieve, validate and create in one go");
    println!("  🐚 certify shell [<NPI>]  # Drive each step yourself");
    println!();
    println!("💡 All provider data is simulated; nothing is sent anywhere.");
    Ok(())
}
