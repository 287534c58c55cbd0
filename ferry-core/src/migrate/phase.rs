//! Per-repository migration phases
//!
//! Each repository walks `Discovered -> NamespaceEnsured -> ProjectEnsured ->
//! Transferred -> Recorded`. `Skipped` and `Failed` are absorbing and can be
//! entered from any non-terminal phase.

use std::fmt;

use crate::error::{Error, Result};

/// Where a repository is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Discovered,
    NamespaceEnsured,
    ProjectEnsured,
    Transferred,
    Recorded,
    Skipped,
    Failed,
}

impl MigrationPhase {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MigrationPhase::Recorded | MigrationPhase::Skipped | MigrationPhase::Failed
        )
    }

    /// The single forward successor, if any
    fn next(&self) -> Option<MigrationPhase> {
        match self {
            MigrationPhase::Discovered => Some(MigrationPhase::NamespaceEnsured),
            MigrationPhase::NamespaceEnsured => Some(MigrationPhase::ProjectEnsured),
            MigrationPhase::ProjectEnsured => Some(MigrationPhase::Transferred),
            MigrationPhase::Transferred => Some(MigrationPhase::Recorded),
            _ => None,
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationPhase::Discovered => "discovered",
            MigrationPhase::NamespaceEnsured => "namespace-ensured",
            MigrationPhase::ProjectEnsured => "project-ensured",
            MigrationPhase::Transferred => "transferred",
            MigrationPhase::Recorded => "recorded",
            MigrationPhase::Skipped => "skipped",
            MigrationPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phase tracker for one repository
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    repo: String,
    current: MigrationPhase,
}

impl PhaseTracker {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            current: MigrationPhase::Discovered,
        }
    }

    pub fn current(&self) -> MigrationPhase {
        self.current
    }

    pub fn can_transition_to(&self, phase: MigrationPhase) -> bool {
        if self.current.is_terminal() {
            return false;
        }
        match phase {
            MigrationPhase::Skipped | MigrationPhase::Failed => true,
            other => self.current.next() == Some(other),
        }
    }

    /// Move to `phase`, rejecting skips and moves out of terminal phases
    pub fn transition_to(&mut self, phase: MigrationPhase) -> Result<()> {
        if !self.can_transition_to(phase) {
            return Err(Error::Other(format!(
                "Invalid transition for {} from {} to {}",
                self.repo, self.current, phase
            )));
        }

        tracing::debug!(
            repo = %self.repo,
            from = %self.current,
            to = %phase,
            "Migration phase transition"
        );

        self.current = phase;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = PhaseTracker::new("acme/widget");
        for phase in [
            MigrationPhase::NamespaceEnsured,
            MigrationPhase::ProjectEnsured,
            MigrationPhase::Transferred,
            MigrationPhase::Recorded,
        ] {
            tracker.transition_to(phase).unwrap();
        }
        assert_eq!(tracker.current(), MigrationPhase::Recorded);
        assert!(tracker.current().is_terminal());
    }

    #[test]
    fn test_cannot_skip_ahead() {
        let mut tracker = PhaseTracker::new("acme/widget");
        assert!(tracker.transition_to(MigrationPhase::Transferred).is_err());
        assert_eq!(tracker.current(), MigrationPhase::Discovered);
    }

    #[test]
    fn test_failed_reachable_from_any_open_phase() {
        let mut tracker = PhaseTracker::new("acme/widget");
        tracker.transition_to(MigrationPhase::NamespaceEnsured).unwrap();
        tracker.transition_to(MigrationPhase::ProjectEnsured).unwrap();
        tracker.transition_to(MigrationPhase::Failed).unwrap();
        assert!(tracker.current().is_terminal());
    }

    #[test]
    fn test_terminal_is_absorbing() {
        let mut tracker = PhaseTracker::new("acme/widget");
        tracker.transition_to(MigrationPhase::Skipped).unwrap();
        assert!(!tracker.can_transition_to(MigrationPhase::Failed));
        assert!(tracker.transition_to(MigrationPhase::NamespaceEnsured).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(MigrationPhase::NamespaceEnsured.to_string(), "namespace-ensured");
    }
}
