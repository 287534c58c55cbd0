//! Ferry Core - Core library for forge-to-forge repository migration
//!
//! This crate discovers repositories on a source forge, provisions matching
//! namespaces and projects on a destination forge, mirrors every ref across
//! with `git`, and records finished migrations in an append-only ledger.

pub mod config;
pub mod enumerate;
pub mod error;
pub mod forge;
pub mod git;
pub mod ledger;
pub mod migrate;
pub mod provision;
pub mod repository;
pub mod secrets;

#[cfg(test)]
mod testing;

pub use config::{
    CliOverrides, Config, DestinationConfig, GitConfig, HttpConfig, MigrationConfig, SourceConfig,
};
pub use enumerate::{dedupe_and_order, list_all};
pub use error::{Error, Result};
pub use forge::{DestinationForge, GroupSummary, SourceForge};
pub use git::{
    CommandOutput, CommandRunner, GitCommand, MirrorStats, MirrorTransfer, OutputLine,
    TransferRequest,
};
pub use ledger::Ledger;
pub use migrate::{
    MigrationOptions, MigrationPhase, Migrator, PhaseTracker, RepoOutcome, RepoReport, RunReport,
};
pub use provision::{ensure_namespace, ensure_project};
pub use repository::{
    CreatedProject, MigrationRecord, NamespaceRef, ProjectOutcome, ProjectSpec,
    RepositoryDescriptor, Visibility,
};
pub use secrets::Secrets;
