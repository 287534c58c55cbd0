//! Migrate command - Mirror source repositories to the destination forge

use std::path::PathBuf;

use clap::Args;
use ferry_core::config::CliOverrides;
use ferry_core::{Config, GitCommand, Ledger, MigrationOptions, Migrator, MirrorTransfer, Secrets};
use ferry_forge::{GitLabClient, GogsClient};

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Source forge base URL
    #[arg(long, env = "FERRY_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Source user whose repositories and organizations are migrated
    #[arg(short = 'u', long, env = "FERRY_SOURCE_USER")]
    pub source_user: Option<String>,

    /// Destination forge base URL
    #[arg(long, env = "FERRY_DESTINATION_URL")]
    pub destination_url: Option<String>,

    /// Destination account owning the token
    #[arg(long, env = "FERRY_DESTINATION_USER")]
    pub destination_user: Option<String>,

    /// Directory for scratch mirror clones
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Process at most this many repositories
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Process repositories even if the ledger lists them
    #[arg(long)]
    pub reprocess: bool,

    /// Keep scratch clones after each transfer
    #[arg(long)]
    pub keep_scratch: bool,

    /// Dry run - list what would be migrated without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl MigrateArgs {
    /// Fold this command's flags into the global overrides
    pub fn overrides(&self, base: CliOverrides) -> CliOverrides {
        CliOverrides {
            source_url: self.source_url.clone(),
            source_user: self.source_user.clone(),
            destination_url: self.destination_url.clone(),
            destination_user: self.destination_user.clone(),
            scratch_dir: self.scratch_dir.clone(),
            max_repos: self.limit,
            reprocess: self.reprocess,
            keep_scratch: self.keep_scratch,
            ..base
        }
    }

    /// Execute the migrate command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        config.validate()?;

        let secrets = Secrets::load()?;
        let (source_token, destination_token) = secrets.require_tokens()?;

        let ledger_path = config.ledger_path()?;
        let mut ledger = Ledger::load(&ledger_path)?;
        tracing::info!(
            ledger = %ledger_path.display(),
            entries = ledger.len(),
            "Loaded migration ledger"
        );

        let source = GogsClient::new(
            &config.source.base_url,
            source_token.clone(),
            config.http.timeout,
        )?;
        let destination = GitLabClient::new(
            &config.destination.base_url,
            destination_token.clone(),
            config.http.timeout,
        )?;

        let transfer = MirrorTransfer::new(GitCommand::new(), config.scratch_dir()?)
            .with_git_program(&config.git.program)
            .preserve_scratch(config.migration.preserve_scratch);

        let options = MigrationOptions {
            max_repos: config.migration.max_repos,
            skip_migrated: config.migration.skip_migrated,
            dry_run: self.dry_run,
            ..MigrationOptions::new(&config.source.username, &config.destination.username)
        };

        let migrator = Migrator::new(
            source,
            destination,
            transfer,
            source_token,
            destination_token,
            options,
        );

        let report = migrator.run(&mut ledger).await?;

        if self.dry_run {
            println!();
            println!("[Dry run] {} repositories would be migrated:", report.planned());
            for repo in &report.repos {
                println!("  {:<40} {:?}", repo.full_name, repo.outcome);
            }
        }

        if report.failed() > 0 {
            tracing::warn!(
                failed = report.failed(),
                "Some repositories failed; re-run to retry them"
            );
        }

        Ok(())
    }
}
