//! In-memory forges and git runner for unit tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::forge::{DestinationForge, GroupSummary, SourceForge};
use crate::git::{CommandOutput, CommandRunner, OutputLine};
use crate::repository::{CreatedProject, ProjectSpec, RepositoryDescriptor, Visibility};
use crate::{Error, Result};

pub const DEST_HOST: &str = "https://gitlab.example.com";

pub fn repo(id: i64, full_name: &str) -> RepositoryDescriptor {
    let (owner, name) = full_name.split_once('/').unwrap();
    RepositoryDescriptor {
        id,
        full_name: full_name.to_string(),
        name: name.to_string(),
        owner_name: owner.to_string(),
        clone_url: format!("https://gogs.example.com/{}.git", full_name),
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub user: Vec<RepositoryDescriptor>,
    pub orgs: Vec<String>,
    pub org_repos: HashMap<String, Vec<RepositoryDescriptor>>,
    pub fail_orgs_listing: bool,
    /// Organization whose repository listing fails
    pub fail_org: Option<String>,
}

#[async_trait]
impl SourceForge for FakeSource {
    async fn user_repos(&self, _user: &str) -> Result<Vec<RepositoryDescriptor>> {
        Ok(self.user.clone())
    }

    async fn user_orgs(&self, _user: &str) -> Result<Vec<String>> {
        if self.fail_orgs_listing {
            return Err(Error::Http("connection refused".to_string()));
        }
        Ok(self.orgs.clone())
    }

    async fn org_repos(&self, org: &str) -> Result<Vec<RepositoryDescriptor>> {
        if self.fail_org.as_deref() == Some(org) {
            return Err(Error::Api {
                forge: "Gogs",
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(self.org_repos.get(org).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct DestinationState {
    groups: Vec<GroupSummary>,
    projects: Vec<(Option<u64>, String)>,
    group_creates: usize,
    project_creates: usize,
    fail_group_create: bool,
    fail_project_create: bool,
    calls: Vec<String>,
}

/// Destination that behaves like a small GitLab: fuzzy group search, name collisions rejected
#[derive(Default, Clone)]
pub struct FakeDestination {
    state: Arc<Mutex<DestinationState>>,
}

impl FakeDestination {
    pub fn add_group(&self, group: GroupSummary) {
        self.state.lock().unwrap().groups.push(group);
    }

    pub fn fail_group_create(&self) {
        self.state.lock().unwrap().fail_group_create = true;
    }

    pub fn fail_project_create(&self) {
        self.state.lock().unwrap().fail_project_create = true;
    }

    pub fn group_creates(&self) -> usize {
        self.state.lock().unwrap().group_creates
    }

    pub fn project_creates(&self) -> usize {
        self.state.lock().unwrap().project_creates
    }

    pub fn group_paths(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .map(|g| g.path.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl DestinationForge for FakeDestination {
    async fn search_groups(&self, search: &str) -> Result<Vec<GroupSummary>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("search {}", search));
        let needle = search.to_lowercase();
        Ok(state
            .groups
            .iter()
            .filter(|g| g.path.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn create_group(&self, name: &str, path: &str, _visibility: Visibility) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_group {}", name));
        if state.fail_group_create {
            return Err(Error::Api {
                forge: "GitLab",
                status: 400,
                message: "Failed to save group".to_string(),
            });
        }
        state.group_creates += 1;
        let id = 100 + state.groups.len() as u64;
        state.groups.push(GroupSummary {
            id,
            path: path.to_string(),
        });
        Ok(id)
    }

    async fn create_project(&self, spec: &ProjectSpec) -> Result<CreatedProject> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_project {}", spec.name));
        if state.fail_project_create {
            return Err(Error::Api {
                forge: "GitLab",
                status: 403,
                message: "403 Forbidden".to_string(),
            });
        }

        let key = (spec.namespace_id, spec.name.to_lowercase());
        if state.projects.contains(&key) {
            return Err(Error::Api {
                forge: "GitLab",
                status: 400,
                message: r#"{"message":{"name":["has already been taken"]}}"#.to_string(),
            });
        }

        let namespace = match spec.namespace_id {
            Some(id) => state
                .groups
                .iter()
                .find(|g| g.id == id)
                .map(|g| g.path.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            None => "dest-user".to_string(),
        };

        state.project_creates += 1;
        state.projects.push(key);
        Ok(CreatedProject {
            id: 1000 + state.projects.len() as u64,
            path_with_namespace: format!("{}/{}", namespace, spec.name),
        })
    }

    fn push_url(&self, path_with_namespace: &str) -> Result<String> {
        Ok(format!("{}/{}.git", DEST_HOST, path_with_namespace))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// Git runner that fakes clone by creating a bare repository with git2
#[derive(Default, Clone)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    fail_clone: Vec<String>,
    fail_push: Vec<String>,
    skip_init: bool,
}

impl FakeRunner {
    /// Fail clones whose URL contains `needle`
    pub fn fail_clone(mut self, needle: &str) -> Self {
        self.fail_clone.push(needle.to_string());
        self
    }

    /// Fail pushes whose URL contains `needle`
    pub fn fail_push(mut self, needle: &str) -> Self {
        self.fail_push.push(needle.to_string());
        self
    }

    /// Report clone success without creating a repository
    pub fn skip_init(mut self) -> Self {
        self.skip_init = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn failure(url: &str) -> CommandOutput {
        CommandOutput {
            code: Some(128),
            lines: vec![OutputLine::Stderr(format!(
                "fatal: unable to access '{}': The requested URL returned error: 403",
                url
            ))],
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });

        match args.first().map(String::as_str) {
            Some("clone") => {
                let url = args.get(2).cloned().unwrap_or_default();
                if self.fail_clone.iter().any(|n| url.contains(n)) {
                    return Ok(Self::failure(&url));
                }
                if !self.skip_init {
                    git2::Repository::init_bare(cwd)?;
                }
                Ok(CommandOutput {
                    code: Some(0),
                    lines: vec![OutputLine::Stderr(
                        "Cloning into bare repository '.'...".to_string(),
                    )],
                })
            }
            Some("push") => {
                let url = args.get(2).cloned().unwrap_or_default();
                if self.fail_push.iter().any(|n| url.contains(n)) {
                    return Ok(Self::failure(&url));
                }
                Ok(CommandOutput {
                    code: Some(0),
                    lines: vec![OutputLine::Stderr("Everything up-to-date".to_string())],
                })
            }
            _ => Ok(CommandOutput {
                code: Some(1),
                lines: Vec::new(),
            }),
        }
    }
}
