use serde::{Deserialize, Serialize};

use super::generator::GeneratedChangelog;
use super::structured::{parse_to_structured, Sections};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Structured changelog plus the range and the rendered Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogDocument {
    pub version: String,
    pub date: String,
    pub sections: Sections,
    pub from_tag: String,
    pub to_tag: String,
    pub markdown: String,
}

impl From<&GeneratedChangelog> for ChangelogDocument {
    fn from(result: &GeneratedChangelog) -> Self {
        let structured = parse_to_structured(&result.changelog);
        Self {
            version: structured.version,
            date: structured.date,
            sections: structured.sections,
            from_tag: result.from_tag.clone(),
            to_tag: result.to_tag.clone(),
            markdown: result.changelog.clone(),
        }
    }
}

pub fn format_output(result: &GeneratedChangelog, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(result.changelog.clone()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ChangelogDocument::from(result))?),
        OutputFormat::Html => Ok(to_html(result)),
    }
}

fn to_html(result: &GeneratedChangelog) -> String {
    let parser = pulldown_cmark::Parser::new(&result.changelog);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Changelog {}...{}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; max-width: 900px; margin: 0 auto; padding: 20px; }}
        h2, h3 {{ border-bottom: 1px solid #e1e4e8; padding-bottom: 0.3em; }}
        code {{ background: #f6f8fa; padding: 2px 4px; border-radius: 3px; }}
    </style>
</head>
<body>
{}
</body>
</html>"#,
        result.from_tag, result.to_tag, html
    )
}
