//! Git operations for ferry
//!
//! This module runs git as an external process and moves repositories between
//! forges with mirror clone and mirror push.

mod command;
mod mirror;
pub mod credentials;

pub use command::{CommandOutput, CommandRunner, GitCommand, OutputLine};
pub use mirror::{inspect_mirror, MirrorStats, MirrorTransfer, ScratchDir, TransferRequest};
