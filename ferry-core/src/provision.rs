//! Destination namespace and project provisioning
//!
//! Both operations are non-fatal: failures are logged and reported to the
//! caller as a degraded result so the migration can still attempt the push.

use tracing::{error, info, warn};

use crate::forge::DestinationForge;
use crate::repository::{fold_case, NamespaceRef, ProjectOutcome, ProjectSpec, Visibility};
use crate::Error;

/// Find or create the destination group named `name`
///
/// A search hit whose path equals `name` (ignoring case) is reused and no
/// create call is issued. Returns `None` if the group could not be created.
pub async fn ensure_namespace<D>(destination: &D, name: &str) -> Option<NamespaceRef>
where
    D: DestinationForge + ?Sized,
{
    match destination.search_groups(name).await {
        Ok(groups) => {
            let wanted = fold_case(name);
            if let Some(existing) = groups.iter().find(|g| fold_case(&g.path) == wanted) {
                info!(group = %name, id = existing.id, "Group already exists on destination");
                return Some(NamespaceRef {
                    name: existing.path.clone(),
                    remote_id: existing.id,
                });
            }
        }
        Err(e) => {
            warn!(group = %name, error = %e, "Group search failed, attempting creation");
        }
    }

    match destination.create_group(name, name, Visibility::Private).await {
        Ok(id) => {
            info!(group = %name, id, "Created destination group");
            Some(NamespaceRef {
                name: name.to_string(),
                remote_id: id,
            })
        }
        Err(e) => {
            error!(group = %name, error = %e, "Failed to create destination group");
            None
        }
    }
}

/// Create the destination project described by `spec`
///
/// A rejection saying the name or path is taken means the project is already
/// there; any other rejection is reported as [`ProjectOutcome::Failed`].
pub async fn ensure_project<D>(destination: &D, spec: &ProjectSpec) -> ProjectOutcome
where
    D: DestinationForge + ?Sized,
{
    match destination.create_project(spec).await {
        Ok(project) => {
            info!(
                project = %project.path_with_namespace,
                id = project.id,
                "Created destination project"
            );
            ProjectOutcome::Created(project)
        }
        Err(e) if is_already_taken(&e) => {
            info!(
                project = %spec.name,
                namespace_id = ?spec.namespace_id,
                "Project already exists on destination"
            );
            ProjectOutcome::Exists
        }
        Err(e) => {
            error!(project = %spec.name, error = %e, "Failed to create destination project");
            ProjectOutcome::Failed(e.to_string())
        }
    }
}

fn is_already_taken(err: &Error) -> bool {
    match err {
        Error::Api {
            status: 400 | 409 | 422,
            message,
            ..
        } => message.contains("has already been taken") || message.contains("already exists"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::GroupSummary;
    use crate::testing::FakeDestination;

    #[tokio::test]
    async fn test_existing_group_is_reused_without_create() {
        let dest = FakeDestination::default();
        dest.add_group(GroupSummary {
            id: 42,
            path: "teamx".to_string(),
        });

        let first = ensure_namespace(&dest, "teamx").await.unwrap();
        let second = ensure_namespace(&dest, "teamx").await.unwrap();

        assert_eq!(first.remote_id, 42);
        assert_eq!(second.remote_id, 42);
        assert_eq!(dest.group_creates(), 0);
    }

    #[tokio::test]
    async fn test_group_match_ignores_case() {
        let dest = FakeDestination::default();
        dest.add_group(GroupSummary {
            id: 7,
            path: "Acme".to_string(),
        });

        let ns = ensure_namespace(&dest, "acme").await.unwrap();
        assert_eq!(ns.remote_id, 7);
        assert_eq!(dest.group_creates(), 0);
    }

    #[tokio::test]
    async fn test_group_match_folds_non_ascii_case() {
        let dest = FakeDestination::default();
        dest.add_group(GroupSummary {
            id: 8,
            path: "ÉQUIPE".to_string(),
        });

        let ns = ensure_namespace(&dest, "équipe").await.unwrap();
        assert_eq!(ns.remote_id, 8);
        assert_eq!(dest.group_creates(), 0);
    }

    #[tokio::test]
    async fn test_partial_search_hit_still_creates() {
        let dest = FakeDestination::default();
        dest.add_group(GroupSummary {
            id: 7,
            path: "acme-labs".to_string(),
        });

        let ns = ensure_namespace(&dest, "acme").await.unwrap();
        assert_ne!(ns.remote_id, 7);
        assert_eq!(dest.group_creates(), 1);
    }

    #[tokio::test]
    async fn test_created_group_is_found_on_second_call() {
        let dest = FakeDestination::default();

        let first = ensure_namespace(&dest, "alice").await.unwrap();
        let second = ensure_namespace(&dest, "alice").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(dest.group_creates(), 1);
    }

    #[tokio::test]
    async fn test_group_create_failure_is_none() {
        let dest = FakeDestination::default();
        dest.fail_group_create();

        assert!(ensure_namespace(&dest, "alice").await.is_none());
    }

    #[tokio::test]
    async fn test_project_created() {
        let dest = FakeDestination::default();
        dest.add_group(GroupSummary {
            id: 3,
            path: "acme".to_string(),
        });

        let outcome = ensure_project(&dest, &ProjectSpec::private("widget", Some(3))).await;
        match outcome {
            ProjectOutcome::Created(project) => {
                assert_eq!(project.path_with_namespace, "acme/widget");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_project_already_taken_is_exists() {
        let dest = FakeDestination::default();
        let spec = ProjectSpec::private("widget", None);

        assert!(matches!(
            ensure_project(&dest, &spec).await,
            ProjectOutcome::Created(_)
        ));
        assert_eq!(ensure_project(&dest, &spec).await, ProjectOutcome::Exists);
    }

    #[tokio::test]
    async fn test_project_other_rejection_is_failed() {
        let dest = FakeDestination::default();
        dest.fail_project_create();

        let outcome = ensure_project(&dest, &ProjectSpec::private("widget", None)).await;
        assert!(matches!(outcome, ProjectOutcome::Failed(_)));
    }
}
