//! Migration orchestration
//!
//! The [`Migrator`] enumerates the source once and then processes repositories
//! strictly one after another: ensure namespace, ensure project, mirror
//! transfer, ledger append. Only enumeration failures and ledger write
//! failures end the run; everything else is logged and the next repository
//! is processed.

mod phase;

use tracing::{error, info, warn};

use crate::enumerate::list_all;
use crate::forge::{DestinationForge, SourceForge};
use crate::git::{CommandRunner, MirrorTransfer, TransferRequest};
use crate::ledger::Ledger;
use crate::provision::{ensure_namespace, ensure_project};
use crate::repository::{NamespaceRef, ProjectOutcome, ProjectSpec, RepositoryDescriptor};
use crate::{Error, Result};

pub use phase::{MigrationPhase, PhaseTracker};

/// Knobs for one migration run
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Source user whose repositories and organizations are enumerated
    pub source_user: String,
    /// Destination account that owns projects created without a group
    pub destination_user: String,
    /// Stop after processing this many repositories (ledger skips don't count)
    pub max_repos: Option<usize>,
    /// Skip repositories already in the ledger
    pub skip_migrated: bool,
    /// Log the plan without touching the destination
    pub dry_run: bool,
}

impl MigrationOptions {
    pub fn new(source_user: impl Into<String>, destination_user: impl Into<String>) -> Self {
        Self {
            source_user: source_user.into(),
            destination_user: destination_user.into(),
            max_repos: None,
            skip_migrated: true,
            dry_run: false,
        }
    }
}

/// How a single repository ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// Pushed and recorded in the ledger
    Migrated { refs: usize },
    /// Present in the ledger and skipped
    AlreadyMigrated,
    /// Would have been processed (dry run)
    Planned,
    CloneFailed(String),
    PushFailed(String),
}

impl RepoOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RepoOutcome::CloneFailed(_) | RepoOutcome::PushFailed(_))
    }
}

/// Result of processing one repository
#[derive(Debug, Clone)]
pub struct RepoReport {
    pub full_name: String,
    pub phase: MigrationPhase,
    pub namespace: Option<NamespaceRef>,
    pub project: Option<ProjectOutcome>,
    pub outcome: RepoOutcome,
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Distinct repositories found on the source
    pub discovered: usize,
    /// Reports in processing order
    pub repos: Vec<RepoReport>,
    /// Whether the run stopped early because of `max_repos`
    pub limit_reached: bool,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&RepoOutcome) -> bool) -> usize {
        self.repos.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn migrated(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Migrated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::AlreadyMigrated))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Planned))
    }

    pub fn failed(&self) -> usize {
        self.count(RepoOutcome::is_failure)
    }

    /// Names in processing order
    pub fn names(&self) -> Vec<&str> {
        self.repos.iter().map(|r| r.full_name.as_str()).collect()
    }
}

/// Drives the migration pipeline
pub struct Migrator<S, D, R> {
    source: S,
    destination: D,
    transfer: MirrorTransfer<R>,
    source_token: String,
    destination_token: String,
    options: MigrationOptions,
}

impl<S, D, R> std::fmt::Debug for Migrator<S, D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S, D, R> Migrator<S, D, R>
where
    S: SourceForge,
    D: DestinationForge,
    R: CommandRunner,
{
    pub fn new(
        source: S,
        destination: D,
        transfer: MirrorTransfer<R>,
        source_token: impl Into<String>,
        destination_token: impl Into<String>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            source,
            destination,
            transfer,
            source_token: source_token.into(),
            destination_token: destination_token.into(),
            options,
        }
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    pub fn transfer(&self) -> &MirrorTransfer<R> {
        &self.transfer
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Run the migration against `ledger`
    ///
    /// Fails only if enumeration fails or a ledger append fails.
    pub async fn run(&self, ledger: &mut Ledger) -> Result<RunReport> {
        let repos = list_all(&self.source, &self.options.source_user).await?;
        let mut report = RunReport {
            discovered: repos.len(),
            ..Default::default()
        };
        let mut processed = 0usize;

        for repo in &repos {
            if ledger.contains_record(&repo.record()) {
                if self.options.skip_migrated {
                    info!(repo = %repo.full_name, "Skipping, already migrated");
                    let mut tracker = PhaseTracker::new(&repo.full_name);
                    tracker.transition_to(MigrationPhase::Skipped)?;
                    report.repos.push(RepoReport {
                        full_name: repo.full_name.clone(),
                        phase: tracker.current(),
                        namespace: None,
                        project: None,
                        outcome: RepoOutcome::AlreadyMigrated,
                    });
                    continue;
                }
                info!(repo = %repo.full_name, "Already in ledger, reprocessing");
            }

            if let Some(max) = self.options.max_repos {
                if processed >= max {
                    info!(max, "Reached repository limit for this run");
                    report.limit_reached = true;
                    break;
                }
            }
            processed += 1;

            if self.options.dry_run {
                info!(repo = %repo.full_name, id = repo.id, "Would migrate");
                report.repos.push(RepoReport {
                    full_name: repo.full_name.clone(),
                    phase: MigrationPhase::Discovered,
                    namespace: None,
                    project: None,
                    outcome: RepoOutcome::Planned,
                });
                continue;
            }

            let repo_report = self.migrate_one(repo, ledger).await?;
            report.repos.push(repo_report);
        }

        info!(
            discovered = report.discovered,
            migrated = report.migrated(),
            skipped = report.skipped(),
            planned = report.planned(),
            failed = report.failed(),
            "Migration run finished"
        );

        Ok(report)
    }

    async fn migrate_one(
        &self,
        repo: &RepositoryDescriptor,
        ledger: &mut Ledger,
    ) -> Result<RepoReport> {
        info!(repo = %repo.full_name, id = repo.id, "Processing repository");
        let mut tracker = PhaseTracker::new(&repo.full_name);

        let namespace = ensure_namespace(&self.destination, &repo.owner_name).await;
        if namespace.is_none() {
            warn!(
                repo = %repo.full_name,
                "No destination group, project falls back to the user namespace"
            );
        }
        tracker.transition_to(MigrationPhase::NamespaceEnsured)?;

        let spec = ProjectSpec::private(&repo.name, namespace.as_ref().map(|ns| ns.remote_id));
        let project = ensure_project(&self.destination, &spec).await;
        tracker.transition_to(MigrationPhase::ProjectEnsured)?;

        let project_path = match &project {
            ProjectOutcome::Created(created) => created.path_with_namespace.clone(),
            _ => match &namespace {
                Some(ns) => format!("{}/{}", ns.name, repo.name),
                None => format!("{}/{}", self.options.destination_user, repo.name),
            },
        };

        let outcome = match self.destination.push_url(&project_path) {
            Ok(destination_url) => {
                let request = TransferRequest {
                    owner: &repo.owner_name,
                    name: &repo.name,
                    source_url: &repo.clone_url,
                    destination_url: &destination_url,
                    source_token: &self.source_token,
                    destination_token: &self.destination_token,
                };
                self.transfer.transfer(&request).await
            }
            Err(e) => Err(Error::Push(e.to_string())),
        };

        let outcome = match outcome {
            Ok(stats) => {
                tracker.transition_to(MigrationPhase::Transferred)?;
                ledger.append(&repo.record())?;
                tracker.transition_to(MigrationPhase::Recorded)?;
                info!(repo = %repo.full_name, refs = stats.refs, "Repository migrated");
                RepoOutcome::Migrated { refs: stats.refs }
            }
            Err(Error::Push(message)) => {
                tracker.transition_to(MigrationPhase::Failed)?;
                error!(
                    repo = %repo.full_name,
                    error = %message,
                    "Push failed, repository not recorded"
                );
                RepoOutcome::PushFailed(message)
            }
            Err(e) => {
                tracker.transition_to(MigrationPhase::Failed)?;
                error!(repo = %repo.full_name, error = %e, "Clone failed, skipping repository");
                RepoOutcome::CloneFailed(e.to_string())
            }
        };

        Ok(RepoReport {
            full_name: repo.full_name.clone(),
            phase: tracker.current(),
            namespace,
            project: Some(project),
            outcome,
        })
    }
}
