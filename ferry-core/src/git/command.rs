//! External command execution for git

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{trace, warn};

use crate::{Error, Result};

/// One captured line of process output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
        }
    }
}

/// Result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    /// Both streams, in the order lines arrived
    pub lines: Vec<OutputLine>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Combined output, one line per entry
    pub fn combined(&self) -> String {
        self.lines
            .iter()
            .map(OutputLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Only the stderr lines
    pub fn stderr(&self) -> String {
        self.lines
            .iter()
            .filter_map(|l| match l {
                OutputLine::Stderr(s) => Some(s.as_str()),
                OutputLine::Stdout(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Runs an external program to completion
///
/// Implementations must drain stdout and stderr while the process runs and
/// return only after it has exited.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCommand;

impl GitCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for GitCommand {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutput> {
        if !cwd.is_dir() {
            return Err(Error::Other(format!(
                "Working directory does not exist: {}",
                cwd.display()
            )));
        }

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Config(format!(
                        "Executable not found at '{}'. Is git installed?",
                        program
                    ))
                } else {
                    Error::Io(e)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Other("Failed to capture stderr".to_string()))?;

        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut lines = Vec::new();

        while stdout_open || stderr_open {
            tokio::select! {
                segment = stdout.next_segment(), if stdout_open => {
                    match read_line("stdout", segment) {
                        Some(line) => lines.push(OutputLine::Stdout(line)),
                        None => stdout_open = false,
                    }
                }
                segment = stderr.next_segment(), if stderr_open => {
                    match read_line("stderr", segment) {
                        Some(line) => lines.push(OutputLine::Stderr(line)),
                        None => stderr_open = false,
                    }
                }
            }
        }

        let status = child.wait().await?;

        Ok(CommandOutput {
            code: status.code(),
            lines,
        })
    }
}

/// Decode one raw output segment; `None` once the stream is done
///
/// Output that is not UTF-8 is decoded lossily. A read error closes the
/// stream but leaves the process running so its exit status is still read.
fn read_line(
    stream: &'static str,
    segment: std::io::Result<Option<Vec<u8>>>,
) -> Option<String> {
    match segment {
        Ok(Some(mut bytes)) => {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            let line = String::from_utf8_lossy(&bytes).into_owned();
            trace!(stream, %line);
            Some(line)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(stream, error = %e, "Stopped reading process output");
            None
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_captures_both_streams_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let output = GitCommand::new()
            .run("sh", &args(&["-c", "echo out; echo err 1>&2; exit 3"]), dir.path())
            .await
            .unwrap();

        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert!(output.lines.contains(&OutputLine::Stdout("out".to_string())));
        assert!(output.lines.contains(&OutputLine::Stderr("err".to_string())));
        assert_eq!(output.stderr(), "err");
    }

    #[tokio::test]
    async fn test_non_utf8_output_is_kept_and_process_runs_to_exit() {
        let dir = TempDir::new().unwrap();
        let output = GitCommand::new()
            .run(
                "sh",
                &args(&[
                    "-c",
                    "printf 'remote: caf\\351\\r\\n' 1>&2; sleep 1; touch done; exit 4",
                ]),
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(output.code, Some(4));
        assert!(dir.path().join("done").exists());
        assert_eq!(output.stderr(), "remote: caf\u{FFFD}");
    }

    #[tokio::test]
    async fn test_success_status() {
        let dir = TempDir::new().unwrap();
        let output = GitCommand::new()
            .run("sh", &args(&["-c", "true"]), dir.path())
            .await
            .unwrap();
        assert!(output.success());
        assert!(output.lines.is_empty());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let err = GitCommand::new()
            .run("/nonexistent/ferry-git-binary", &[], dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_workdir() {
        let err = GitCommand::new()
            .run("sh", &args(&["-c", "true"]), Path::new("/nonexistent/path/12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Other(_)));
    }
}
