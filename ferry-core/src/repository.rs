//! Repository, namespace and project records shared across the pipeline

use std::fmt;

use serde::{Deserialize, Serialize};

/// Case folding used for every identity comparison (dedup, ledger, groups)
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// A repository discovered on the source forge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    /// Source-native id, used for ordering
    pub id: i64,
    /// `owner/name`, compared case-insensitively
    pub full_name: String,
    /// Repository name
    pub name: String,
    /// Owning user or organization
    pub owner_name: String,
    /// HTTP(S) clone URL on the source forge
    pub clone_url: String,
}

impl RepositoryDescriptor {
    /// Case-folded `full_name`, the deduplication key
    pub fn dedup_key(&self) -> String {
        fold_case(&self.full_name)
    }

    /// Ledger record for this repository
    pub fn record(&self) -> MigrationRecord {
        MigrationRecord::new(&self.owner_name, &self.name)
    }
}

/// A destination namespace (group), either found or freshly created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRef {
    /// Namespace path
    pub name: String,
    /// Destination-native id
    pub remote_id: u64,
}

/// Destination project visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        }
    }
}

/// Request to create a destination project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub name: String,
    /// Falls back to the authenticated user's namespace when absent
    pub namespace_id: Option<u64>,
    pub visibility: Visibility,
}

impl ProjectSpec {
    /// Private project spec, the only kind ferry creates
    pub fn private(name: impl Into<String>, namespace_id: Option<u64>) -> Self {
        Self {
            name: name.into(),
            namespace_id,
            visibility: Visibility::Private,
        }
    }
}

/// A project returned by the destination on creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProject {
    pub id: u64,
    /// e.g. `acme/widget`
    pub path_with_namespace: String,
}

/// Result of ensuring a destination project exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    /// The project was created by this call
    Created(CreatedProject),
    /// The destination reported the project is already there
    Exists,
    /// The destination rejected the request for another reason
    Failed(String),
}

/// Identity of a migrated repository, rendered as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationRecord {
    pub owner_name: String,
    pub repo_name: String,
}

impl MigrationRecord {
    pub fn new(owner_name: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
            repo_name: repo_name.into(),
        }
    }

    /// Parse a ledger line
    ///
    /// Accepts the canonical `owner/name` shape and the legacy `name | owner` shape.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some((name, owner)) = line.split_once('|') {
            let (name, owner) = (name.trim(), owner.trim());
            if name.is_empty() || owner.is_empty() {
                return None;
            }
            return Some(Self::new(owner, name));
        }

        let (owner, name) = line.split_once('/')?;
        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    /// Case-folded identity used for membership tests
    pub fn key(&self) -> String {
        fold_case(&self.to_string())
    }
}

impl fmt::Display for MigrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_name, self.repo_name)
    }
}
