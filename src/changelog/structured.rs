//! Reads back the Markdown produced by `ChangelogRenderer` into a structured
//! document. Only that exact format is understood.
//!
//! The line format has no escaping: a subject that itself starts with
//! `**x**: ` reads back as scope `x`, and one ending in ` by [@u](v)` reads
//! back with author `u`.

use regex::{Captures, Regex};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::LazyLock;

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^## \[(.*?)\] - (.*)$").expect("Invalid regex"));

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^### (:[\w+-]+: )?").expect("Invalid regex"));

static ENTRY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^- \[`(.*?)`\]\((.*?)\) - (?:\*\*(.*?)\*\*: )?(.*?)(?: by \[@(.*?)\]\((.*?)\))?$",
    )
    .expect("Invalid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredEntry {
    pub hash: String,
    pub url: String,
    pub scope: Option<String>,
    pub subject: String,
    pub author: Option<String>,
    pub author_url: Option<String>,
}

/// Section header to entries, kept in document order. Serializes as a JSON
/// object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections(Vec<(String, Vec<StructuredEntry>)>);

impl Sections {
    pub fn get(&self, header: &str) -> Option<&[StructuredEntry]> {
        self.0
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(h, _)| h.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Start (or restart) a section and return its index.
    fn open(&mut self, header: String) -> usize {
        match self.0.iter().position(|(h, _)| *h == header) {
            Some(idx) => {
                self.0[idx].1.clear();
                idx
            }
            None => {
                self.0.push((header, Vec::new()));
                self.0.len() - 1
            }
        }
    }
}

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (header, entries) in &self.0 {
            map.serialize_entry(header, entries)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredChangelog {
    pub version: String,
    pub date: String,
    pub sections: Sections,
}

pub fn parse_to_structured(markdown: &str) -> StructuredChangelog {
    let mut doc = StructuredChangelog::default();
    let mut current: Option<usize> = None;

    for line in markdown.lines() {
        if line.starts_with("### ") {
            let header = HEADING_REGEX.replace(line, "").trim().to_string();
            current = Some(doc.sections.open(header));
        } else if line.starts_with("## ") {
            if let Some(caps) = VERSION_REGEX.captures(line) {
                doc.version = caps[1].to_string();
                doc.date = caps[2].to_string();
            }
        } else if line.starts_with("- ") {
            let (Some(idx), Some(caps)) = (current, ENTRY_REGEX.captures(line)) else {
                continue;
            };
            doc.sections.0[idx].1.push(entry_from(&caps));
        }
    }

    doc
}

fn entry_from(caps: &Captures) -> StructuredEntry {
    let optional = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    StructuredEntry {
        hash: caps[1].to_string(),
        url: caps[2].to_string(),
        scope: optional(3),
        subject: caps[4].to_string(),
        author: optional(5),
        author_url: optional(6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::commit_parser::CommitParser;
    use crate::changelog::range_resolver::TagPair;
    use crate::changelog::renderer::ChangelogRenderer;
    use crate::config::ChangelogOptions;
    use crate::github::fake::raw_commit;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_rendered_document() {
        let markdown = "## [main] - 2024-05-01

### :sparkles: New Features
- [`abcdef1`](https://github.com/x/y/commit/abcdef1234567890) - **auth**: add OAuth login by [@alice](https://github.com/alice)

### :bug: Bug Fixes
- [`2222222`](https://github.com/x/y/commit/2222222bbbb) - crash on start
";
        let doc = parse_to_structured(markdown);

        assert_eq!(doc.version, "main");
        assert_eq!(doc.date, "2024-05-01");
        assert_eq!(
            doc.sections.headers().collect::<Vec<_>>(),
            vec!["New Features", "Bug Fixes"]
        );
        assert_eq!(
            doc.sections.get("New Features").unwrap()[0],
            StructuredEntry {
                hash: "abcdef1".into(),
                url: "https://github.com/x/y/commit/abcdef1234567890".into(),
                scope: Some("auth".into()),
                subject: "add OAuth login".into(),
                author: Some("alice".into()),
                author_url: Some("https://github.com/alice".into()),
            }
        );

        let fix = &doc.sections.get("Bug Fixes").unwrap()[0];
        assert_eq!(fix.scope, None);
        assert_eq!(fix.author, None);
        assert_eq!(fix.subject, "crash on start");
    }

    #[test]
    fn test_round_trip_with_renderer() {
        let commits = CommitParser::parse_commits(&[
            raw_commit("1111111aaaa", "feat(api): paginate results", Some("alice")),
            raw_commit("2222222bbbb", "fix: handle by-reference args", Some("bob")),
            raw_commit("3333333cccc", "perf(db)!: batch writes", None),
            raw_commit("4444444dddd", "Merge pull request #9 from x/y", None),
        ]);
        let tags = TagPair {
            latest: "main".into(),
            previous: "v1.0.0".into(),
        };
        let options = ChangelogOptions::for_url("https://github.com/x/y");
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let doc = parse_to_structured(&ChangelogRenderer::render_on(&commits, &tags, &options, date));

        assert_eq!(doc.version, "main");
        assert_eq!(doc.date, "2024-05-01");
        let entries: Vec<&StructuredEntry> = doc
            .sections
            .headers()
            .flat_map(|h| doc.sections.get(h).unwrap())
            .collect();
        assert_eq!(entries.len(), commits.len());

        for commit in &commits {
            let entry = entries
                .iter()
                .find(|e| e.hash == commit.short_sha())
                .unwrap();
            assert_eq!(entry.url, commit.url);
            assert_eq!(entry.scope, commit.scope);
            assert_eq!(entry.subject, commit.subject);
            assert_eq!(entry.author, commit.author);
            assert_eq!(entry.author_url, commit.author_url);
        }
    }

    #[test]
    fn test_sections_serialize_as_ordered_object() {
        let doc = parse_to_structured(
            "## [main] - 2024-05-01\n\n### Tests\n- [`a`](u) - t\n\n### Build\n- [`b`](v) - b\n",
        );
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            json,
            r#"{"version":"main","date":"2024-05-01","sections":{"Tests":[{"hash":"a","url":"u","scope":null,"subject":"t","author":null,"authorUrl":null}],"Build":[{"hash":"b","url":"v","scope":null,"subject":"b","author":null,"authorUrl":null}]}}"#
        );
    }

    #[test]
    fn test_no_changes_message_yields_empty_document() {
        let doc = parse_to_structured("No changes found between these versions.");
        assert_eq!(doc, StructuredChangelog::default());
    }

    #[test]
    fn test_entries_before_any_section_are_ignored() {
        let doc = parse_to_structured("- [`a`](u) - orphan\n### Tests\n");
        assert!(doc.sections.get("Tests").unwrap().is_empty());
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn test_subject_shaped_like_entry_grammar_is_ambiguous() {
        let commits = CommitParser::parse_commits(&[
            raw_commit("5555555eeee", "**x**: y", None),
            raw_commit("6666666ffff", "revert by [@u](v)", None),
        ]);
        assert_eq!(commits[0].subject, "**x**: y");
        let tags = TagPair {
            latest: "main".into(),
            previous: "v1.0.0".into(),
        };
        let options = ChangelogOptions::for_url("https://github.com/x/y");
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let doc = parse_to_structured(&ChangelogRenderer::render_on(&commits, &tags, &options, date));
        let other = doc.sections.get("Other Changes").unwrap();

        assert_eq!(other[0].scope.as_deref(), Some("x"));
        assert_eq!(other[0].subject, "y");
        assert_eq!(other[1].subject, "revert");
        assert_eq!(other[1].author.as_deref(), Some("u"));
        assert_eq!(other[1].author_url.as_deref(), Some("v"));
    }
}
