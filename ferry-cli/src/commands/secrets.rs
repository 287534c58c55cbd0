//! Secrets commands

use clap::{Args, Subcommand};
use ferry_core::Secrets;

/// Secrets file management
#[derive(Args, Debug)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: SecretsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SecretsCommand {
    /// Write a template secrets file with restrictive permissions
    Init,

    /// Show where secrets are read from
    Path,
}

impl SecretsArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self.command {
            SecretsCommand::Init => {
                let path = Secrets::create_template()?;
                println!("Created {}", path.display());
                println!("Edit it and add your Gogs and GitLab tokens.");
            }
            SecretsCommand::Path => match Secrets::default_secrets_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("(could not determine config directory)"),
            },
        }
        Ok(())
    }
}
