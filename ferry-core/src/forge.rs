//! Forge API seams
//!
//! The pipeline talks to both forges only through these traits. The HTTP
//! implementations live in `ferry-forge`; tests use in-memory fakes.

use async_trait::async_trait;

use crate::repository::{CreatedProject, ProjectSpec, RepositoryDescriptor, Visibility};
use crate::Result;

/// Read-only access to the source forge
#[async_trait]
pub trait SourceForge: Send + Sync {
    /// Repositories owned directly by `user`
    async fn user_repos(&self, user: &str) -> Result<Vec<RepositoryDescriptor>>;

    /// Names of the organizations `user` belongs to
    async fn user_orgs(&self, user: &str) -> Result<Vec<String>>;

    /// Repositories owned by organization `org`
    async fn org_repos(&self, org: &str) -> Result<Vec<RepositoryDescriptor>>;
}

/// A namespace as returned by a destination group search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: u64,
    pub path: String,
}

/// Write access to the destination forge
#[async_trait]
pub trait DestinationForge: Send + Sync {
    /// Groups whose name or path matches `search`
    async fn search_groups(&self, search: &str) -> Result<Vec<GroupSummary>>;

    /// Create a group and return its id
    async fn create_group(&self, name: &str, path: &str, visibility: Visibility) -> Result<u64>;

    /// Create a project
    async fn create_project(&self, spec: &ProjectSpec) -> Result<CreatedProject>;

    /// Git push URL (without credentials) for a project path such as `acme/widget`
    fn push_url(&self, path_with_namespace: &str) -> Result<String>;
}
