//! Append-only ledger of migrated repositories
//!
//! The ledger is a plain text file with one `owner/name` identity per line.
//! It is loaded once at startup and appended to after every successful push.
//! Membership is case-insensitive and duplicate lines are tolerated; the file
//! is never rewritten, so deduplication only happens on load.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::repository::{fold_case, MigrationRecord};
use crate::{Error, Result};

/// Default ledger file name inside the data directory
const LEDGER_FILE: &str = "migrated_repos.txt";

/// In-memory view of the ledger file plus its backing path
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    entries: HashSet<String>,
}

impl Ledger {
    /// Load the ledger from `path`
    ///
    /// A missing file yields an empty ledger. Blank lines are ignored, and
    /// lines that are not a repository identity are skipped with a warning.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut entries = HashSet::new();

        if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read ledger {}: {}", path.display(), e))
            })?;

            for (lineno, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match MigrationRecord::parse(line) {
                    Some(record) => {
                        entries.insert(record.key());
                    }
                    None => warn!(
                        path = %path.display(),
                        line = lineno + 1,
                        "Ignoring unrecognized ledger line"
                    ),
                }
            }
        }

        debug!(path = %path.display(), entries = entries.len(), "Loaded ledger");
        Ok(Self { path, entries })
    }

    /// Get the default ledger path
    ///
    /// Returns `~/.local/share/ferry/migrated_repos.txt` on Linux
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;

        Ok(data_dir.join("ferry").join(LEDGER_FILE))
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Case-insensitive membership test
    ///
    /// Accepts anything [`MigrationRecord::parse`] understands.
    pub fn contains(&self, identity: &str) -> bool {
        match MigrationRecord::parse(identity) {
            Some(record) => self.contains_record(&record),
            None => self.entries.contains(&fold_case(identity.trim())),
        }
    }

    pub fn contains_record(&self, record: &MigrationRecord) -> bool {
        self.entries.contains(&record.key())
    }

    /// Durably append one identity line
    pub fn append(&mut self, record: &MigrationRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", record)?;
        file.sync_data()?;

        self.entries.insert(record.key());
        debug!(path = %self.path.display(), record = %record, "Appended ledger entry");
        Ok(())
    }

    /// Number of distinct identities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted list of identities, lowercased
    pub fn identities(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().cloned().collect();
        ids.sort();
        ids
    }
}
