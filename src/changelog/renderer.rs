use chrono::{NaiveDate, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::commit_parser::{ParsedCommit, OTHER_TYPE};
use super::range_resolver::TagPair;
use crate::config::ChangelogOptions;
use crate::github::parse_github_url;

/// `#123` not already part of a link or a word.
static ISSUE_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w\[/&])#(\d+)\b").expect("Invalid regex"));

/// One changelog section and the commit types that feed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitType {
    pub types: &'static [&'static str],
    pub header: &'static str,
    pub icon: &'static str,
}

impl CommitType {
    pub fn primary(&self) -> &'static str {
        self.types[0]
    }

    pub fn matches(&self, commit_type: &str) -> bool {
        self.types.iter().any(|t| *t == commit_type)
    }
}

/// Sections in output order.
pub const COMMIT_TYPES: [CommitType; 8] = [
    CommitType {
        types: &["feat"],
        header: "New Features",
        icon: ":sparkles:",
    },
    CommitType {
        types: &["fix"],
        header: "Bug Fixes",
        icon: ":bug:",
    },
    CommitType {
        types: &["perf"],
        header: "Performance",
        icon: ":zap:",
    },
    CommitType {
        types: &["refactor"],
        header: "Refactors",
        icon: ":recycle:",
    },
    CommitType {
        types: &["test"],
        header: "Tests",
        icon: ":white_check_mark:",
    },
    CommitType {
        types: &["build", "ci"],
        header: "Build",
        icon: ":construction_worker:",
    },
    CommitType {
        types: &["docs"],
        header: "Documentation",
        icon: ":memo:",
    },
    CommitType {
        types: &[OTHER_TYPE],
        header: "Other Changes",
        icon: ":flying_saucer:",
    },
];

pub struct ChangelogRenderer;

impl ChangelogRenderer {
    /// Render with today's (UTC) date in the version line.
    pub fn render(commits: &[ParsedCommit], tags: &TagPair, options: &ChangelogOptions) -> String {
        Self::render_on(commits, tags, options, Utc::now().date_naive())
    }

    pub fn render_on(
        commits: &[ParsedCommit],
        tags: &TagPair,
        options: &ChangelogOptions,
        date: NaiveDate,
    ) -> String {
        let mut ordered: Vec<&ParsedCommit> = commits.iter().collect();
        if options.reverse_order {
            ordered.reverse();
        }

        let issue_base = if options.include_ref_issues {
            parse_github_url(&options.github_url)
                .ok()
                .map(|repo| repo.html_url())
        } else {
            None
        };

        let sections: Vec<String> = COMMIT_TYPES
            .iter()
            .filter(|commit_type| Self::is_enabled(commit_type, options))
            .filter_map(|commit_type| {
                let entries: Vec<String> = ordered
                    .iter()
                    .filter(|c| commit_type.matches(&c.commit_type))
                    .filter(|c| !Self::scope_excluded(c, options))
                    .map(|c| Self::format_entry(c, issue_base.as_deref()))
                    .collect();

                if entries.is_empty() {
                    return None;
                }
                Some(format!(
                    "{}\n{}",
                    Self::heading(commit_type, options.use_gitmojis),
                    entries.join("\n")
                ))
            })
            .collect();

        format!(
            "## [{}] - {}\n\n{}\n",
            tags.latest,
            date.format("%Y-%m-%d"),
            sections.join("\n\n")
        )
    }

    fn is_enabled(commit_type: &CommitType, options: &ChangelogOptions) -> bool {
        if !options.restrict_to_types.is_empty() {
            return commit_type
                .types
                .iter()
                .any(|t| options.restrict_to_types.iter().any(|r| r == t));
        }
        commit_type.primary() == OTHER_TYPE
            || !options
                .exclude_types
                .iter()
                .any(|t| t == commit_type.primary())
    }

    fn scope_excluded(commit: &ParsedCommit, options: &ChangelogOptions) -> bool {
        commit
            .scope
            .as_ref()
            .is_some_and(|scope| options.exclude_scopes.contains(scope))
    }

    fn heading(commit_type: &CommitType, use_gitmojis: bool) -> String {
        if use_gitmojis {
            format!("### {} {}", commit_type.icon, commit_type.header)
        } else {
            format!("### {}", commit_type.header)
        }
    }

    fn format_entry(commit: &ParsedCommit, issue_base: Option<&str>) -> String {
        let scope = commit
            .scope
            .as_ref()
            .map(|s| format!("**{}**: ", s))
            .unwrap_or_default();
        let subject = match issue_base {
            Some(base) => Self::link_issue_refs(&commit.subject, base),
            None => commit.subject.clone(),
        };
        let author = commit
            .author
            .as_ref()
            .map(|a| format!(" by [@{}]({})", a, commit.author_url.as_deref().unwrap_or("")))
            .unwrap_or_default();

        format!(
            "- [`{}`]({}) - {}{}{}",
            commit.short_sha(),
            commit.url,
            scope,
            subject,
            author
        )
    }

    fn link_issue_refs(subject: &str, repo_url: &str) -> String {
        ISSUE_REF_REGEX
            .replace_all(subject, |caps: &Captures| {
                format!(
                    "{}[#{}]({}/issues/{})",
                    &caps[1], &caps[2], repo_url, &caps[2]
                )
            })
            .into_owned()
    }
}
