use serde::{Deserialize, Serialize};

use crate::github::client::DEFAULT_TIMEOUT;

/// Per-request changelog options. Field names follow the JSON shape callers
/// send (`githubUrl`, `excludeTypes`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangelogOptions {
    pub github_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_tag: Option<String>,
    pub exclude_types: Vec<String>,
    pub exclude_scopes: Vec<String>,
    /// Allow-list of commit types; when non-empty `exclude_types` is ignored.
    pub restrict_to_types: Vec<String>,
    pub include_ref_issues: bool,
    /// When false, commits that are not conventional are left out.
    pub include_invalid_commits: bool,
    pub use_gitmojis: bool,
    pub reverse_order: bool,
}

impl Default for ChangelogOptions {
    fn default() -> Self {
        Self {
            github_url: String::new(),
            from_tag: None,
            to_tag: None,
            exclude_types: Vec::new(),
            exclude_scopes: Vec::new(),
            restrict_to_types: Vec::new(),
            include_ref_issues: false,
            include_invalid_commits: true,
            use_gitmojis: false,
            reverse_order: false,
        }
    }
}

impl ChangelogOptions {
    pub fn for_url(github_url: impl Into<String>) -> Self {
        Self {
            github_url: github_url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub defaults: DefaultsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Alternate API root, e.g. a GitHub Enterprise `/api/v3` endpoint.
    pub api_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Option defaults applied before command-line flags.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub exclude_types: Vec<String>,
    pub exclude_scopes: Vec<String>,
    pub restrict_to_types: Vec<String>,
    pub include_ref_issues: bool,
    pub include_invalid_commits: bool,
    pub use_gitmojis: bool,
    pub reverse_order: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            exclude_types: Vec::new(),
            exclude_scopes: Vec::new(),
            restrict_to_types: Vec::new(),
            include_ref_issues: false,
            include_invalid_commits: true,
            use_gitmojis: false,
            reverse_order: false,
        }
    }
}

impl DefaultsConfig {
    pub fn options_for(&self, github_url: impl Into<String>) -> ChangelogOptions {
        ChangelogOptions {
            github_url: github_url.into(),
            from_tag: None,
            to_tag: None,
            exclude_types: self.exclude_types.clone(),
            exclude_scopes: self.exclude_scopes.clone(),
            restrict_to_types: self.restrict_to_types.clone(),
            include_ref_issues: self.include_ref_issues,
            include_invalid_commits: self.include_invalid_commits,
            use_gitmojis: self.use_gitmojis,
            reverse_order: self.reverse_order,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Distinct credentials whose generator (and cache) is kept alive.
    pub max_generators: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_generators: 64,
        }
    }
}
