//! Ferry Forge - HTTP clients for the forges ferry migrates between
//!
//! [`GogsClient`] reads repositories from a Gogs instance and [`GitLabClient`]
//! provisions groups and projects on GitLab. Both implement the forge traits
//! from `ferry-core`.

mod error;
mod gitlab;
mod gogs;
mod http;

pub use error::{Error, Result};
pub use gitlab::GitLabClient;
pub use gogs::GogsClient;
