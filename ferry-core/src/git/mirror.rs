//! Mirror transfer between forges
//!
//! A transfer clones the source with `git clone --mirror` into a fresh scratch
//! directory and pushes it to the destination with `git push --mirror`, so
//! every branch, tag and ref arrives exactly as it was on the source.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::command::{CommandOutput, CommandRunner};
use super::credentials::{redact, strip_credentials, with_oauth2_token, with_token_user};
use crate::{Error, Result};

/// Everything needed to move one repository
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    /// Owner on the source forge, used for the scratch directory name
    pub owner: &'a str,
    /// Repository name, used for the scratch directory name
    pub name: &'a str,
    /// Source clone URL without credentials
    pub source_url: &'a str,
    /// Destination push URL without credentials
    pub destination_url: &'a str,
    pub source_token: &'a str,
    pub destination_token: &'a str,
}

/// What a successful transfer moved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorStats {
    /// Number of refs in the mirror clone
    pub refs: usize,
    /// Scratch directory, still on disk only when preserved
    pub scratch: PathBuf,
}

/// Per-attempt scratch directory, removed on drop unless preserved
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    preserve: bool,
}

impl ScratchDir {
    /// Create a uniquely named empty directory under `root`
    pub fn create(root: &Path, owner: &str, name: &str, preserve: bool) -> Result<Self> {
        let dir_name = format!(
            "repo-{}-{}-{}",
            sanitize(owner),
            sanitize(name),
            Uuid::new_v4()
        );
        Self::create_named(root.join(dir_name), preserve)
    }

    /// Create `path` as an empty directory, removing anything already there
    pub fn create_named(path: PathBuf, preserve: bool) -> Result<Self> {
        if path.exists() {
            warn!(path = %path.display(), "Removing stale scratch directory");
            fs::remove_dir_all(&path).map_err(|e| {
                Error::Other(format!(
                    "Failed to remove stale scratch directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        fs::create_dir_all(&path).map_err(|e| {
            Error::Other(format!(
                "Failed to create scratch directory {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self { path, preserve })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.preserve {
            info!(path = %self.path.display(), "Keeping scratch directory");
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove scratch directory"
                );
            }
        } else {
            debug!(path = %self.path.display(), "Removed scratch directory");
        }
    }
}

/// Replace path separators and other awkward characters for directory names
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '-',
        })
        .collect()
}

/// Count the refs in a bare mirror, failing if `path` is not one
pub fn inspect_mirror(path: &Path) -> Result<usize> {
    let repo = Repository::open_bare(path)?;
    if !repo.is_bare() {
        return Err(Error::Other(format!(
            "Expected a bare mirror repository at {}",
            path.display()
        )));
    }
    let refs = repo.references()?.flatten().count();
    Ok(refs)
}

/// Git mirror transfer engine
#[derive(Debug)]
pub struct MirrorTransfer<R> {
    runner: R,
    git_program: String,
    scratch_root: PathBuf,
    preserve_scratch: bool,
}

impl<R: CommandRunner> MirrorTransfer<R> {
    pub fn new(runner: R, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            git_program: "git".to_string(),
            scratch_root: scratch_root.into(),
            preserve_scratch: false,
        }
    }

    /// Set a custom path to the git executable
    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    /// Keep scratch directories after every transfer
    pub fn preserve_scratch(mut self, preserve: bool) -> Self {
        self.preserve_scratch = preserve;
        self
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Mirror one repository from source to destination
    ///
    /// Returns [`Error::Clone`] or [`Error::Push`] for the step that failed.
    /// The scratch directory is released on every path.
    pub async fn transfer(&self, request: &TransferRequest<'_>) -> Result<MirrorStats> {
        let secrets = [request.source_token, request.destination_token];
        let source = with_token_user(request.source_url, request.source_token)
            .map_err(|e| Error::Clone(e.to_string()))?;
        let destination = with_oauth2_token(request.destination_url, request.destination_token)
            .map_err(|e| Error::Push(e.to_string()))?;

        let scratch = ScratchDir::create(
            &self.scratch_root,
            request.owner,
            request.name,
            self.preserve_scratch,
        )
        .map_err(|e| Error::Clone(e.to_string()))?;

        info!(
            source = %strip_credentials(request.source_url),
            scratch = %scratch.path().display(),
            "Cloning mirror from source"
        );
        let clone_args = vec![
            "clone".to_string(),
            "--mirror".to_string(),
            source,
            ".".to_string(),
        ];
        let output = self
            .git(&clone_args, scratch.path(), &secrets)
            .await
            .map_err(|e| Error::Clone(e.to_string()))?;
        if !output.success() {
            let detail = redact(&output.stderr(), &secrets);
            error!(code = ?output.code, "git clone --mirror failed");
            return Err(Error::Clone(exit_detail(&output, &detail)));
        }

        let refs = inspect_mirror(scratch.path()).map_err(|e| {
            Error::Clone(format!("Clone did not produce a bare mirror: {}", e))
        })?;
        if refs == 0 {
            warn!("Source repository has no refs");
        }
        debug!(refs, "Mirror clone complete");

        info!(
            destination = %strip_credentials(request.destination_url),
            "Pushing mirror to destination"
        );
        let push_args = vec!["push".to_string(), "--mirror".to_string(), destination];
        let output = self
            .git(&push_args, scratch.path(), &secrets)
            .await
            .map_err(|e| Error::Push(e.to_string()))?;
        if !output.success() {
            let detail = redact(&output.stderr(), &secrets);
            error!(code = ?output.code, "git push --mirror failed");
            return Err(Error::Push(exit_detail(&output, &detail)));
        }

        Ok(MirrorStats {
            refs,
            scratch: scratch.path().to_path_buf(),
        })
    }

    async fn git(&self, args: &[String], cwd: &Path, secrets: &[&str]) -> Result<CommandOutput> {
        let output = self.runner.run(&self.git_program, args, cwd).await?;
        for line in &output.lines {
            let text = redact(line.text(), secrets);
            if !text.trim().is_empty() {
                debug!(target: "ferry::git", "{}", text);
            }
        }
        Ok(output)
    }
}

fn exit_detail(output: &CommandOutput, stderr: &str) -> String {
    let code = output
        .code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    if stderr.trim().is_empty() {
        format!("git exited with {}", code)
    } else {
        format!("git exited with {}: {}", code, stderr.trim())
    }
}
