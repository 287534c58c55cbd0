//! GitLab API client (destination forge)

use std::time::Duration;

use async_trait::async_trait;
use ferry_core::{CreatedProject, DestinationForge, GroupSummary, ProjectSpec, Visibility};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::http::{api_roots, build_client, endpoint, send_json};
use crate::{Error, Result};

const FORGE: &str = "GitLab";

/// Groups returned per search page
const SEARCH_PAGE_SIZE: u32 = 100;

/// Group fields we need from `/groups` responses
#[derive(Debug, Clone, Deserialize)]
struct GitLabGroup {
    id: u64,
    path: String,
}

/// Project fields we need from `/projects` responses
#[derive(Debug, Clone, Deserialize)]
struct GitLabProject {
    id: u64,
    path_with_namespace: String,
}

#[derive(Debug, Serialize)]
struct CreateGroup<'a> {
    name: &'a str,
    path: &'a str,
    visibility: Visibility,
}

#[derive(Debug, Serialize)]
struct CreateProject<'a> {
    name: &'a str,
    visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<u64>,
}

/// GitLab client authenticated with a personal access token
#[derive(Clone)]
pub struct GitLabClient {
    http: Client,
    instance: Url,
    api: Url,
    token: String,
}

impl GitLabClient {
    /// Create a client for the instance at `base_url` (e.g. `https://gitlab.example.com`)
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let (instance, api) = api_roots(base_url, "/api/v4")?;
        let http = build_client(timeout)?;

        info!(api = %api, "Created GitLab client");

        Ok(Self {
            http,
            instance,
            api,
            token: token.into(),
        })
    }

    /// API root, ending in `/api/v4/`
    pub fn api_url(&self) -> &Url {
        &self.api
    }

    /// Search groups by name or path
    pub async fn groups(&self, search: &str) -> Result<Vec<GroupSummary>> {
        let url = endpoint(&self.api, &["groups"])?;
        debug!(url = %url, search, "Searching groups");
        let request = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("search", search)])
            .query(&[("per_page", SEARCH_PAGE_SIZE)]);

        let groups: Vec<GitLabGroup> = send_json(FORGE, request).await?;
        Ok(groups
            .into_iter()
            .map(|g| GroupSummary {
                id: g.id,
                path: g.path,
            })
            .collect())
    }

    /// Create a top-level group
    pub async fn new_group(&self, name: &str, path: &str, visibility: Visibility) -> Result<u64> {
        let url = endpoint(&self.api, &["groups"])?;
        let request = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&CreateGroup {
                name,
                path,
                visibility,
            });

        let group: GitLabGroup = send_json(FORGE, request).await?;
        Ok(group.id)
    }

    /// Create a project
    pub async fn new_project(&self, spec: &ProjectSpec) -> Result<CreatedProject> {
        let url = endpoint(&self.api, &["projects"])?;
        let request = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&CreateProject {
                name: &spec.name,
                visibility: spec.visibility,
                namespace_id: spec.namespace_id,
            });

        let project: GitLabProject = send_json(FORGE, request).await?;
        Ok(CreatedProject {
            id: project.id,
            path_with_namespace: project.path_with_namespace,
        })
    }

    /// HTTPS git URL for `path_with_namespace`, e.g. `https://gitlab.example.com/acme/widget.git`
    pub fn repo_url(&self, path_with_namespace: &str) -> Result<String> {
        let mut segments: Vec<String> = path_with_namespace
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        // A project path needs at least a namespace and a name
        if segments.len() < 2 {
            return Err(Error::Url(format!(
                "Invalid project path: {}",
                path_with_namespace
            )));
        }
        if let Some(last) = segments.last_mut() {
            last.push_str(".git");
        }

        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        Ok(endpoint(&self.instance, &refs)?.into())
    }
}

impl std::fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabClient")
            .field("api", &self.api.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DestinationForge for GitLabClient {
    async fn search_groups(&self, search: &str) -> ferry_core::Result<Vec<GroupSummary>> {
        Ok(self.groups(search).await?)
    }

    async fn create_group(
        &self,
        name: &str,
        path: &str,
        visibility: Visibility,
    ) -> ferry_core::Result<u64> {
        Ok(self.new_group(name, path, visibility).await?)
    }

    async fn create_project(&self, spec: &ProjectSpec) -> ferry_core::Result<CreatedProject> {
        Ok(self.new_project(spec).await?)
    }

    fn push_url(&self, path_with_namespace: &str) -> ferry_core::Result<String> {
        Ok(self.repo_url(path_with_namespace)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitLabClient {
        GitLabClient::new("https://gitlab.example.com/", "t", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_repo_url() {
        assert_eq!(
            client().repo_url("acme/widget").unwrap(),
            "https://gitlab.example.com/acme/widget.git"
        );
    }

    #[test]
    fn test_repo_url_under_subpath() {
        let client =
            GitLabClient::new("https://example.com/gitlab/api/v4", "t", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            client.repo_url("acme/sub/widget").unwrap(),
            "https://example.com/gitlab/acme/sub/widget.git"
        );
    }

    #[test]
    fn test_repo_url_rejects_bare_name() {
        assert!(client().repo_url("widget").is_err());
        assert!(client().repo_url("").is_err());
    }

    #[test]
    fn test_create_project_body_omits_missing_namespace() {
        let body = serde_json::to_value(CreateProject {
            name: "widget",
            visibility: Visibility::Private,
            namespace_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"name": "widget", "visibility": "private"}));
    }
}
