use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::github::types::RawCommit;

/// `type(scope)!: subject` on the first line of a commit message.
static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?-u:\w)+)(?:\(([^)]+)\))?!?: (.+)").expect("Invalid regex")
});

pub const OTHER_TYPE: &str = "other";

const EMPTY_SUBJECT: &str = "(no commit message)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommit {
    #[serde(rename = "type")]
    pub commit_type: String,
    pub scope: Option<String>,
    pub subject: String,
    pub body: Option<String>,
    pub sha: String,
    pub url: String,
    pub author: Option<String>,
    pub author_url: Option<String>,
}

impl ParsedCommit {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    pub fn is_conventional(&self) -> bool {
        self.commit_type != OTHER_TYPE
    }
}

pub struct CommitParser;

impl CommitParser {
    pub fn parse_commits(commits: &[RawCommit]) -> Vec<ParsedCommit> {
        commits.iter().map(Self::parse).collect()
    }

    /// Classify one commit. Messages that are not conventional land in `other`.
    pub fn parse(commit: &RawCommit) -> ParsedCommit {
        let message = commit.commit.message.replace("\r\n", "\n");
        let first_line = message.lines().next().unwrap_or("").trim();

        let (commit_type, scope, subject) = match CONVENTIONAL_REGEX.captures(first_line) {
            Some(caps) => (
                caps[1].to_lowercase(),
                caps.get(2).map(|m| m.as_str().to_string()),
                caps[3].trim_end().to_string(),
            ),
            None => (OTHER_TYPE.to_string(), None, first_line.to_string()),
        };

        let subject = if subject.is_empty() {
            EMPTY_SUBJECT.to_string()
        } else {
            subject
        };

        ParsedCommit {
            commit_type,
            scope,
            subject,
            body: Self::extract_body(&message),
            sha: commit.sha.clone(),
            url: commit.html_url.clone(),
            author: commit.author.as_ref().map(|a| a.login.clone()),
            author_url: commit.author.as_ref().map(|a| a.html_url.clone()),
        }
    }

    /// The paragraph right after the first blank line.
    fn extract_body(message: &str) -> Option<String> {
        message
            .split("\n\n")
            .nth(1)
            .map(str::trim)
            .filter(|body| !body.is_empty())
            .map(str::to_string)
    }

    /// Drop commits that did not follow the conventional format.
    pub fn retain_conventional(commits: Vec<ParsedCommit>) -> Vec<ParsedCommit> {
        commits.into_iter().filter(ParsedCommit::is_conventional).collect()
    }
}
