//! Error types shared by the changelog pipeline.
//!
//! - `InvalidUrl`: the caller's `githubUrl` is not a GitHub repository URL
//! - `NotFound`: the repository or a referenced commit does not exist
//! - `Upstream`: any other GitHub API failure, message passed through
//! - `Timeout`: a single API request exceeded the configured timeout

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub API error: {0}")]
    Upstream(String),

    #[error("GitHub API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChangelogError>;
