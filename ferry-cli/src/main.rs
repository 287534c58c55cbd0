//! Ferry CLI - Command line interface for ferry
//!
//! Mirrors repositories from a Gogs instance to GitLab.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ferry_core::{config::CliOverrides, Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{LedgerArgs, MigrateArgs, SecretsArgs};

/// Ferry: mirror repositories from Gogs to GitLab
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/ferry/config.toml)
    #[arg(short, long, global = true, env = "FERRY_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger file (overrides config and env)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Migrate repositories from the source to the destination forge
    #[command(visible_alias = "m")]
    Migrate(MigrateArgs),

    /// Inspect the migration ledger
    Ledger(LedgerArgs),

    /// Manage the secrets file
    Secrets(SecretsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let base_overrides = CliOverrides {
        ledger_path: cli.ledger.clone(),
        ..Default::default()
    };

    match cli.command {
        Some(Commands::Version) => {
            println!("ferry {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Migrate(args)) => {
            let overrides = args.overrides(base_overrides);
            let config = Config::load_with_overrides(cli.config.as_deref(), overrides)?;
            args.execute(&config).await?;
        }
        Some(Commands::Ledger(args)) => {
            let config = Config::load_with_overrides(cli.config.as_deref(), base_overrides)?;
            args.execute(&config)?;
        }
        Some(Commands::Secrets(args)) => {
            args.execute()?;
        }
        Some(Commands::Config) => {
            let config = Config::load_with_overrides(cli.config.as_deref(), base_overrides)?;
            show_config(&config, cli.config.as_deref());
        }
        None => {
            println!("Ferry - mirror repositories from Gogs to GitLab");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn show_config(config: &Config, explicit_path: Option<&std::path::Path>) {
    fn or_unset(value: &str) -> &str {
        if value.is_empty() {
            "(not set)"
        } else {
            value
        }
    }

    println!("Ferry Configuration");
    println!("===================");
    println!();
    println!("Source:");
    println!("  base_url: {}", or_unset(&config.source.base_url));
    println!("  username: {}", or_unset(&config.source.username));
    println!();
    println!("Destination:");
    println!("  base_url: {}", or_unset(&config.destination.base_url));
    println!("  username: {}", or_unset(&config.destination.username));
    println!();
    println!("Migration:");
    match config.ledger_path() {
        Ok(path) => println!("  ledger: {}", path.display()),
        Err(e) => println!("  ledger: ({})", e),
    }
    match config.scratch_dir() {
        Ok(path) => println!("  scratch_dir: {}", path.display()),
        Err(e) => println!("  scratch_dir: ({})", e),
    }
    match config.migration.max_repos {
        Some(max) => println!("  max_repos: {}", max),
        None => println!("  max_repos: (unlimited)"),
    }
    println!("  skip_migrated: {}", config.migration.skip_migrated);
    println!("  preserve_scratch: {}", config.migration.preserve_scratch);
    println!();
    println!("git: {}", config.git.program);
    println!("http timeout: {}s", config.http.timeout.as_secs());
    println!();

    let path = explicit_path
        .map(|p| p.to_path_buf())
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }

    match Secrets::load() {
        Ok(secrets) => {
            let state = |present: bool| if present { "set" } else { "missing" };
            println!(
                "Tokens: source {}, destination {}",
                state(secrets.source_token().is_some()),
                state(secrets.destination_token().is_some())
            );
        }
        Err(e) => println!("Tokens: ({})", e),
    }
}
