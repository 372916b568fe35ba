use anyhow::Result;
use clap::Parser;

use certify::cli::commands::{
    check::CheckCommand, run::RunCommand, shell::InteractiveShell, show_how_to_start, Command,
};
use certify::cli::{Cli, Commands};
use certify::telemetry::{init_telemetry, shutdown_telemetry};
use certify::workflows::WorkflowSettings;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = certify::config()?;
    let mut observability = config.observability.clone();
    observability.json_logs |= cli.json_logs;
    init_telemetry(&observability)?;

    let settings = WorkflowSettings::from(&config.workflow);
    tracing::debug!(?settings, "Workflow settings resolved");

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            Some(Commands::Check { npi }) => CheckCommand::new(npi).execute().await,
            Some(Commands::Run {
                npi,
                seed,
                no_create,
                json,
            }) => {
                RunCommand::new(npi, settings)
                    .with_seed(seed)
                    .with_create(!no_create)
                    .with_json(json)
                    .execute()
                    .await
            }
            Some(Commands::Shell { npi, seed }) => {
                InteractiveShell::new(settings)
                    .with_npi(npi)
                    .with_seed(seed)
                    .execute()
                    .await
            }
            None => show_how_to_start().await,
        }
    });

    shutdown_telemetry();
    result
}
