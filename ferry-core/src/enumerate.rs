//! Source repository discovery

use std::collections::HashSet;

use tracing::{debug, info};

use crate::forge::SourceForge;
use crate::repository::RepositoryDescriptor;
use crate::Result;

/// List every repository visible through `user` on the source forge
///
/// Collects the user's own repositories followed by each organization's, then
/// deduplicates and orders them with [`dedupe_and_order`]. Any failed listing
/// call fails the whole enumeration.
pub async fn list_all<S>(source: &S, user: &str) -> Result<Vec<RepositoryDescriptor>>
where
    S: SourceForge + ?Sized,
{
    info!(user, "Fetching source user repositories");
    let mut all = source.user_repos(user).await?;
    debug!(user, count = all.len(), "Fetched user repositories");

    info!(user, "Fetching source organizations");
    let orgs = source.user_orgs(user).await?;
    info!(user, count = orgs.len(), "Fetched organizations");

    for org in &orgs {
        info!(org = %org, "Fetching organization repositories");
        let repos = source.org_repos(org).await?;
        debug!(org = %org, count = repos.len(), "Fetched organization repositories");
        all.extend(repos);
    }

    let collected = all.len();
    let repos = dedupe_and_order(all);
    info!(collected, distinct = repos.len(), "Enumerated source repositories");

    Ok(repos)
}

/// Keep the first occurrence of each `full_name` (case-insensitive), then sort by id descending
///
/// The sort is stable, so repositories sharing an id keep collection order.
pub fn dedupe_and_order(repos: Vec<RepositoryDescriptor>) -> Vec<RepositoryDescriptor> {
    let mut seen = HashSet::new();
    let mut distinct: Vec<RepositoryDescriptor> = repos
        .into_iter()
        .filter(|repo| seen.insert(repo.dedup_key()))
        .collect();

    distinct.sort_by(|a, b| b.id.cmp(&a.id));
    distinct
}
