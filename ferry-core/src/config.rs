//! Configuration management for ferry
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (FERRY_*)
//! 3. Config file (~/.config/ferry/config.toml)
//! 4. Default values
//!
//! Tokens are not part of this file; see [`crate::secrets`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::{Error, Result};

/// Source forge (Gogs) settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Instance root, e.g. `https://gogs.example.com`
    pub base_url: String,

    /// User whose repositories and organizations are migrated
    pub username: String,
}

/// Destination forge (GitLab) settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Instance root, e.g. `https://gitlab.example.com`
    pub base_url: String,

    /// Account owning the token; projects land here when no group is available
    pub username: String,
}

/// Migration run settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Ledger file (defaults to the data directory)
    pub ledger_path: Option<PathBuf>,

    /// Parent directory for per-repository scratch clones (defaults to the cache directory)
    pub scratch_dir: Option<PathBuf>,

    /// Process at most this many repositories per run
    pub max_repos: Option<usize>,

    /// Skip repositories already present in the ledger
    pub skip_migrated: bool,

    /// Leave scratch clones on disk after the transfer
    pub preserve_scratch: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            ledger_path: None,
            scratch_dir: None,
            max_repos: None,
            skip_migrated: true,
            preserve_scratch: false,
        }
    }
}

/// Git invocation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    /// Path to the git executable
    pub program: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout, e.g. "30s"
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub migration: MigrationConfig,
    pub git: GitConfig,
    pub http: HttpConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub source_url: Option<String>,
    pub source_user: Option<String>,
    pub destination_url: Option<String>,
    pub destination_user: Option<String>,
    pub ledger_path: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
    pub max_repos: Option<usize>,
    pub reprocess: bool,
    pub keep_scratch: bool,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/ferry/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ferry").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - FERRY_SOURCE_URL, FERRY_SOURCE_USER
    /// - FERRY_DESTINATION_URL, FERRY_DESTINATION_USER
    /// - FERRY_LEDGER: Ledger file path
    /// - FERRY_GIT: Path to git executable
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("FERRY_SOURCE_URL") {
            self.source.base_url = url;
        }
        if let Ok(user) = std::env::var("FERRY_SOURCE_USER") {
            self.source.username = user;
        }
        if let Ok(url) = std::env::var("FERRY_DESTINATION_URL") {
            self.destination.base_url = url;
        }
        if let Ok(user) = std::env::var("FERRY_DESTINATION_USER") {
            self.destination.username = user;
        }
        if let Ok(path) = std::env::var("FERRY_LEDGER") {
            self.migration.ledger_path = Some(PathBuf::from(path));
        }
        if let Ok(git) = std::env::var("FERRY_GIT") {
            self.git.program = git;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(url) = cli.source_url {
            self.source.base_url = url;
        }
        if let Some(user) = cli.source_user {
            self.source.username = user;
        }
        if let Some(url) = cli.destination_url {
            self.destination.base_url = url;
        }
        if let Some(user) = cli.destination_user {
            self.destination.username = user;
        }
        if let Some(path) = cli.ledger_path {
            self.migration.ledger_path = Some(path);
        }
        if let Some(dir) = cli.scratch_dir {
            self.migration.scratch_dir = Some(dir);
        }
        if let Some(max) = cli.max_repos {
            self.migration.max_repos = Some(max);
        }
        if cli.reprocess {
            self.migration.skip_migrated = false;
        }
        if cli.keep_scratch {
            self.migration.preserve_scratch = true;
        }

        self
    }

    /// Load configuration from `path` (or the default location) with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(path: Option<&Path>, cli: CliOverrides) -> Result<Self> {
        let base = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };
        Ok(base.with_env_overrides().with_cli_overrides(cli))
    }

    /// Check that everything a migration run needs is present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("source.base_url", &self.source.base_url),
            ("source.username", &self.source.username),
            ("destination.base_url", &self.destination.base_url),
            ("destination.username", &self.destination.username),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("Missing required setting: {}", key)));
            }
        }

        for (key, value) in [
            ("source.base_url", &self.source.base_url),
            ("destination.base_url", &self.destination.base_url),
        ] {
            let url = url::Url::parse(value)
                .map_err(|e| Error::Config(format!("Invalid {}: {} ({})", key, value, e)))?;
            if url.scheme() != "https" && url.scheme() != "http" {
                return Err(Error::Config(format!(
                    "Invalid {}: {}. Expected an http(s) URL",
                    key, value
                )));
            }
        }

        if self.migration.max_repos == Some(0) {
            return Err(Error::Config(
                "migration.max_repos must be at least 1 (omit it for no limit)".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolved ledger path
    pub fn ledger_path(&self) -> Result<PathBuf> {
        match &self.migration.ledger_path {
            Some(path) => Ok(path.clone()),
            None => Ledger::default_path(),
        }
    }

    /// Resolved scratch root
    ///
    /// Returns `~/.cache/ferry/scratch` unless configured
    pub fn scratch_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.migration.scratch_dir {
            return Ok(dir.clone());
        }

        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| Error::Config("Could not determine cache directory".to_string()))?;

        Ok(cache_dir.join("ferry").join("scratch"))
    }
}
