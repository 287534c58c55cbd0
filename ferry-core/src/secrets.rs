//! Secrets management for ferry
//!
//! Forge tokens are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/ferry/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (FERRY_SOURCE_TOKEN, FERRY_DESTINATION_TOKEN)
//! 2. Secrets file (~/.config/ferry/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Secrets structure
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Source forge credentials
    pub source: TokenSecret,
    /// Destination forge credentials
    pub destination: TokenSecret,
}

/// A single access token
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenSecret {
    pub token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("source", &self.source.token.as_ref().map(|_| "<redacted>"))
            .field("destination", &self.destination.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(
                path = %path.display(),
                mode = format!("{:o}", mode & 0o777),
                "Secrets file permissions OK"
            );
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        for token in [&mut secrets.source.token, &mut secrets.destination.token]
            .into_iter()
            .flatten()
        {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/ferry/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ferry").join("secrets.toml"))
    }

    /// Source forge token
    ///
    /// Priority: FERRY_SOURCE_TOKEN env var > secrets file
    pub fn source_token(&self) -> Option<String> {
        resolve_token("FERRY_SOURCE_TOKEN", self.source.token.as_deref())
    }

    /// Destination forge token
    ///
    /// Priority: FERRY_DESTINATION_TOKEN env var > secrets file
    pub fn destination_token(&self) -> Option<String> {
        resolve_token("FERRY_DESTINATION_TOKEN", self.destination.token.as_deref())
    }

    /// Both tokens, or a configuration error naming whichever is missing
    pub fn require_tokens(&self) -> Result<(String, String)> {
        let source = self.source_token().ok_or_else(|| {
            Error::Config(
                "Source token not found. Set FERRY_SOURCE_TOKEN \
                 or add [source] token to ~/.config/ferry/secrets.toml"
                    .to_string(),
            )
        })?;
        let destination = self.destination_token().ok_or_else(|| {
            Error::Config(
                "Destination token not found. Set FERRY_DESTINATION_TOKEN \
                 or add [destination] token to ~/.config/ferry/secrets.toml"
                    .to_string(),
            )
        })?;
        Ok((source, destination))
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;
        Self::create_template_at(&path)?;
        Ok(path)
    }

    /// Create a template secrets file at `path`
    pub fn create_template_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# Ferry Secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[source]
# Gogs access token (Settings > Applications)
token = ""

[destination]
# GitLab personal access token with api and write_repository scopes
token = ""
"#;

        std::fs::write(path, template).map_err(Error::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your tokens");

        Ok(())
    }
}

fn resolve_token(env_var: &str, from_file: Option<&str>) -> Option<String> {
    if let Ok(token) = std::env::var(env_var) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            debug!(env_var, "Using token from environment variable");
            return Some(token);
        }
    }

    from_file
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}
