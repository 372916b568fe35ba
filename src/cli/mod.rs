use clap::{Parser, Subcommand};

pub mod commands;
pub mod render;

#[derive(Parser)]
#[command(name = "certify")]
#[command(about = "Provider credentialing workflow demo")]
#[command(long_about = "Certify walks a provider through a simulated credentialing workflow: \
                       retrieve CAQH and NPI data, validate it, and create the credentialing \
                       workflow. All data is mock data; nothing leaves this machine.")]
pub struct Cli {
    /// Emit JSON log lines on stderr
    #[arg(long, global = true, help = "Emit structured JSON logs on stderr")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a provider number is acceptable for sign-in
    Check {
        /// 10-digit National Provider Identifier
        npi: String,
    },
    /// Sign in and run the whole workflow unattended
    Run {
        /// 10-digit National Provider Identifier
        npi: String,
        /// Seed the validation draw for a reproducible outcome
        #[arg(long, help = "Seed for the simulated validation outcome")]
        seed: Option<u64>,
        /// Stop after validation instead of creating the workflow
        #[arg(long, help = "Do not create the credentialing workflow after validation")]
        no_create: bool,
        /// Print the final state as JSON
        #[arg(long, help = "Print the final workflow snapshot as JSON")]
        json: bool,
    },
    /// Drive the workflow step by step from an interactive prompt
    Shell {
        /// Sign in with this provider number right away
        npi: Option<String>,
        /// Seed the validation draw for a reproducible outcome
        #[arg(long, help = "Seed for the simulated validation outcome")]
        seed: Option<u64>,
    },
}
