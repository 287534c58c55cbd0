//! Ledger commands - Inspect the record of migrated repositories

use clap::{Args, Subcommand};
use ferry_core::{Config, Ledger};

/// Ledger inspection commands
#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// List migrated repositories
    List,

    /// Check whether a repository has been migrated
    Check {
        /// Repository as owner/name
        repo: String,
    },
}

impl LedgerArgs {
    /// Execute the ledger command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = config.ledger_path()?;
        let ledger = Ledger::load(&path)?;

        match &self.command {
            LedgerCommand::List => {
                println!("Ledger: {}", path.display());
                if ledger.is_empty() {
                    println!("  (no migrated repositories)");
                }
                for identity in ledger.identities() {
                    println!("  {}", identity);
                }
            }
            LedgerCommand::Check { repo } => {
                if ledger.contains(repo) {
                    println!("{}: migrated", repo);
                } else {
                    println!("{}: not migrated", repo);
                }
            }
        }

        Ok(())
    }
}
