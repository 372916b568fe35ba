use anyhow::Result;

use crate::auth::ProviderNumber;
use crate::cli::commands::Command;

pub struct CheckCommand {
    pub input: String,
}

impl CheckCommand {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl Command for CheckCommand {
    async fn execute(&self) -> Result<()> {
        match ProviderNumber::parse(&self.input) {
            Ok(npi) => {
                println!("✅ NPI {npi} is accepted for sign-in");
                Ok(())
            }
            Err(e) => {
                println!("❌ Cannot sign in: {e}");
                Err(e.into())
            }
        }
    }
}
