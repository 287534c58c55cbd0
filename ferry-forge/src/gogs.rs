//! Gogs API client (source forge)

use std::time::Duration;

use async_trait::async_trait;
use ferry_core::{RepositoryDescriptor, SourceForge};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::http::{api_roots, build_client, endpoint, send_json};
use crate::Result;

const FORGE: &str = "Gogs";

/// Repository as returned by `/api/v1/.../repos`
#[derive(Debug, Clone, Deserialize)]
struct GogsRepo {
    id: i64,
    name: String,
    full_name: String,
    clone_url: String,
    owner: GogsUser,
}

/// User or organization; Gogs reports both with a `username`
#[derive(Debug, Clone, Deserialize)]
struct GogsUser {
    username: String,
}

impl From<GogsRepo> for RepositoryDescriptor {
    fn from(repo: GogsRepo) -> Self {
        RepositoryDescriptor {
            id: repo.id,
            full_name: repo.full_name,
            name: repo.name,
            owner_name: repo.owner.username,
            clone_url: repo.clone_url,
        }
    }
}

/// Read-only Gogs client authenticated with an access token
#[derive(Clone)]
pub struct GogsClient {
    http: Client,
    api: Url,
    token: String,
}

impl GogsClient {
    /// Create a client for the instance at `base_url` (e.g. `https://gogs.example.com`)
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let (_, api) = api_roots(base_url, "/api/v1")?;
        let http = build_client(timeout)?;

        info!(api = %api, "Created Gogs client");

        Ok(Self {
            http,
            api,
            token: token.into(),
        })
    }

    /// API root, ending in `/api/v1/`
    pub fn api_url(&self) -> &Url {
        &self.api
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = endpoint(&self.api, segments)?;
        debug!(url = %url, "GET");
        let request = self
            .http
            .get(url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/json");
        send_json(FORGE, request).await
    }

    async fn repos(&self, segments: &[&str]) -> Result<Vec<RepositoryDescriptor>> {
        let repos: Vec<GogsRepo> = self.get(segments).await?;
        Ok(repos.into_iter().map(RepositoryDescriptor::from).collect())
    }
}

impl std::fmt::Debug for GogsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GogsClient")
            .field("api", &self.api.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SourceForge for GogsClient {
    async fn user_repos(&self, user: &str) -> ferry_core::Result<Vec<RepositoryDescriptor>> {
        Ok(self.repos(&["users", user, "repos"]).await?)
    }

    async fn user_orgs(&self, user: &str) -> ferry_core::Result<Vec<String>> {
        let orgs: Vec<GogsUser> = self.get(&["users", user, "orgs"]).await?;
        Ok(orgs.into_iter().map(|org| org.username).collect())
    }

    async fn org_repos(&self, org: &str) -> ferry_core::Result<Vec<RepositoryDescriptor>> {
        Ok(self.repos(&["orgs", org, "repos"]).await?)
    }
}
