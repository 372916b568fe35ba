use anyhow::{bail, Result};
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::commands::{build_driver, Command};
use crate::cli::render::{render_notification, render_snapshot};
use crate::notifications::ChannelNotifier;
use crate::session::{Portal, SessionError};
use crate::shutdown::ShutdownCoordinator;
use crate::workflows::WorkflowSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Login(String),
    Retrieve,
    Validate,
    Create,
    Status,
    Wait,
    Logout,
    Help,
    Quit,
    Empty,
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(ShellCommand::Empty);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "login" => match words.next() {
                Some(npi) => ShellCommand::Login(npi.to_string()),
                None => bail!("usage: login <NPI>"),
            },
            "retrieve" => ShellCommand::Retrieve,
            "validate" => ShellCommand::Validate,
            "create" => ShellCommand::Create,
            "status" => ShellCommand::Status,
            "wait" => ShellCommand::Wait,
            "logout" => ShellCommand::Logout,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(command)
    }
}

/// Interactive prompt that exposes each workflow action separately.
pub struct InteractiveShell {
    pub npi: Option<String>,
    pub settings: WorkflowSettings,
    pub seed: Option<u64>,
}

impl InteractiveShell {
    pub fn new(settings: WorkflowSettings) -> Self {
        Self {
            npi: None,
            settings,
            seed: None,
        }
    }

    pub fn with_npi(mut self, npi: Option<String>) -> Self {
        self.npi = npi;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    async fn handle(&self, portal: &mut Portal, command: ShellCommand) {
        match command {
            ShellCommand::Login(npi) => match portal.login(&npi).await {
                Ok(session) => println!("🔐 Signed in as NPI {}", session.provider_number),
                Err(e) => println!("❌ {e}"),
            },
            ShellCommand::Retrieve => report(portal.retrieve().await),
            ShellCommand::Validate => report(portal.validate().await),
            ShellCommand::Create => report(portal.create_workflow().await),
            ShellCommand::Status => println!("{}", render_snapshot(&portal.snapshot().await)),
            ShellCommand::Wait => {
                let snapshot = portal.driver().wait_until_settled().await;
                println!("{}", render_snapshot(&snapshot));
            }
            ShellCommand::Logout => match portal.logout().await {
                Some(session) => println!("👋 Signed out NPI {}", session.provider_number),
                None => println!("Not signed in"),
            },
            ShellCommand::Help => print_help(),
            ShellCommand::Quit | ShellCommand::Empty => {}
        }
    }
}

fn report(result: Result<(), SessionError>) {
    if let Err(e) = result {
        println!("❌ {e}");
    }
}

fn print_help() {
    println!("Commands:");
    println!("  login <NPI>   Sign in (resets the workflow)");
    println!("  retrieve      Retrieve CAQH and NPI data");
    println!("  validate      Validate the retrieved data");
    println!("  create        Create the credentialing workflow");
    println!("  status        Show the workflow panel");
    println!("  wait          Wait for the running step to finish");
    println!("  logout        Sign out and cancel pending work");
    println!("  quit          Leave the shell");
}

impl Command for InteractiveShell {
    async fn execute(&self) -> Result<()> {
        let (notifier, mut notifications) = ChannelNotifier::new();
        let driver = build_driver(self.settings, self.seed, Arc::new(notifier));
        let shutdown = ShutdownCoordinator::new(driver.clone());
        let mut portal = Portal::new(driver);

        let printer = tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                println!("{}", render_notification(&notification));
            }
        });

        println!("🛡️  Certify credentialing shell");
        print_help();
        if let Some(npi) = &self.npi {
            self.handle(&mut portal, ShellCommand::Login(npi.clone())).await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("certify> ");
            let _ = std::io::stdout().flush();

            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match line.parse::<ShellCommand>() {
                        Ok(ShellCommand::Quit) => break,
                        Ok(command) => self.handle(&mut portal, command).await,
                        Err(e) => println!("❓ {e}"),
                    }
                }
                signal = ShutdownCoordinator::wait_for_signal() => {
                    signal?;
                    println!();
                    shutdown.shutdown().await?;
                    break;
                }
            }
        }

        if portal.logout().await.is_some() {
            println!("👋 Signed out");
        }
        printer.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "login 1234567890".parse::<ShellCommand>().unwrap(),
            ShellCommand::Login("1234567890".to_string())
        );
        assert_eq!("  RETRIEVE ".parse::<ShellCommand>().unwrap(), ShellCommand::Retrieve);
        assert_eq!("exit".parse::<ShellCommand>().unwrap(), ShellCommand::Quit);
        assert_eq!("?".parse::<ShellCommand>().unwrap(), ShellCommand::Help);
        assert_eq!("".parse::<ShellCommand>().unwrap(), ShellCommand::Empty);
    }

    #[test]
    fn test_parse_rejects_unknown_and_incomplete() {
        assert!("login".parse::<ShellCommand>().is_err());
        let err = "launch".parse::<ShellCommand>().unwrap_err();
        assert!(err.to_string().contains("unknown command 'launch'"));
    }
}
