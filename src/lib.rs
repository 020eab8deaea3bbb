//! Conventional-commit changelogs for GitHub repositories.
//!
//! `ChangelogGenerator::generate` resolves a tag range, pulls the commits in
//! it from the GitHub API, classifies them by conventional-commit type and
//! renders a grouped Markdown changelog.

pub mod changelog;
pub mod config;
pub mod error;
pub mod github;
pub mod server;

pub use changelog::{ChangelogGenerator, GeneratedChangelog};
pub use config::ChangelogOptions;
pub use error::{ChangelogError, Result};
