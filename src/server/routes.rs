use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::error::ApiError;
use super::SharedGenerators;
use crate::changelog::ChangelogDocument;
use crate::config::ChangelogOptions;

/// Types left out of GET responses unless the caller says otherwise.
pub const DEFAULT_EXCLUDED_TYPES: [&str; 4] = ["build", "docs", "other", "style"];

pub fn routes(generators: SharedGenerators) -> Router {
    Router::new()
        .route("/api/changelog", get(get_changelog))
        .route("/changelog", post(post_changelog))
        .with_state(generators)
}

/// Query string of `GET /api/changelog`. List values are JSON-encoded arrays.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogQuery {
    pub url: Option<String>,
    pub exclude_types: Option<String>,
    pub exclude_scopes: Option<String>,
    pub include_ref_issues: Option<String>,
    pub use_gitmojis: Option<String>,
    pub include_invalid_commits: Option<String>,
    pub reverse_order: Option<String>,
    pub from_tag: Option<String>,
    pub to_tag: Option<String>,
}

impl ChangelogQuery {
    pub fn into_options(self) -> Result<ChangelogOptions, ApiError> {
        let github_url = self
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::BadRequest("GitHub URL is required".into()))?;

        let exclude_types = match self.exclude_types {
            Some(raw) => json_list("excludeTypes", &raw)?,
            None => DEFAULT_EXCLUDED_TYPES.iter().map(|t| t.to_string()).collect(),
        };
        let exclude_scopes = match self.exclude_scopes {
            Some(raw) => json_list("excludeScopes", &raw)?,
            None => Vec::new(),
        };

        Ok(ChangelogOptions {
            github_url,
            from_tag: self.from_tag.filter(|t| !t.is_empty()),
            to_tag: self.to_tag.filter(|t| !t.is_empty()),
            exclude_types,
            exclude_scopes,
            restrict_to_types: Vec::new(),
            include_ref_issues: self.include_ref_issues.as_deref() == Some("true"),
            include_invalid_commits: self.include_invalid_commits.as_deref() != Some("false"),
            use_gitmojis: self.use_gitmojis.as_deref() != Some("false"),
            reverse_order: self.reverse_order.as_deref() == Some("true"),
        })
    }
}

fn json_list(name: &str, raw: &str) -> Result<Vec<String>, ApiError> {
    serde_json::from_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {}: {}", name, e)))
}

/// Body of `POST /changelog`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogRequest {
    pub github_url: Option<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ChangelogRequest {
    /// Caller options layered over the download defaults.
    pub fn into_options(self) -> Result<ChangelogOptions, ApiError> {
        let github_url = self
            .github_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing required parameter: githubUrl".into()))?;

        let mut merged = json!({
            "includeRefIssues": true,
            "useGitmojis": true,
            "includeInvalidCommits": false,
            "reverseOrder": false,
        });
        if let Value::Object(map) = &mut merged {
            map.extend(self.options);
            map.insert("githubUrl".into(), Value::String(github_url));
        }

        serde_json::from_value(merged)
            .map_err(|e| ApiError::BadRequest(format!("Invalid options: {}", e)))
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn get_changelog(
    State(generators): State<SharedGenerators>,
    headers: HeaderMap,
    query: Result<Query<ChangelogQuery>, QueryRejection>,
) -> Result<Json<ChangelogDocument>, ApiError> {
    let Query(query) = query?;
    let options = query.into_options()?;
    let generator = generators.for_token(bearer_token(&headers))?;
    let result = generator.generate(&options).await?;
    Ok(Json(ChangelogDocument::from(&result)))
}

async fn post_changelog(
    State(generators): State<SharedGenerators>,
    headers: HeaderMap,
    request: Result<Json<ChangelogRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request?;
    let options = request.into_options()?;
    let generator = generators.for_token(bearer_token(&headers))?;
    let result = generator.generate(&options).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown"),
            (header::CONTENT_DISPOSITION, "attachment; filename=CHANGELOG.md"),
        ],
        result.changelog,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn query(url: &str) -> ChangelogQuery {
        ChangelogQuery {
            url: Some(url.to_string()),
            ..ChangelogQuery::default()
        }
    }

    #[test]
    fn test_query_defaults() {
        let options = query("https://github.com/x/y").into_options().unwrap();

        assert_eq!(options.github_url, "https://github.com/x/y");
        assert_eq!(options.exclude_types, vec!["build", "docs", "other", "style"]);
        assert!(options.use_gitmojis);
        assert!(options.include_invalid_commits);
        assert!(!options.include_ref_issues);
        assert!(!options.reverse_order);
        assert!(options.from_tag.is_none());
    }

    #[test]
    fn test_query_flags_and_tags() {
        let options = ChangelogQuery {
            exclude_types: Some(r#"["fix"]"#.into()),
            exclude_scopes: Some(r#"["deps"]"#.into()),
            include_ref_issues: Some("true".into()),
            use_gitmojis: Some("false".into()),
            include_invalid_commits: Some("false".into()),
            reverse_order: Some("true".into()),
            from_tag: Some("v1.0.0".into()),
            to_tag: Some(String::new()),
            ..query("https://github.com/x/y")
        }
        .into_options()
        .unwrap();

        assert_eq!(options.exclude_types, vec!["fix"]);
        assert_eq!(options.exclude_scopes, vec!["deps"]);
        assert!(options.include_ref_issues);
        assert!(!options.use_gitmojis);
        assert!(!options.include_invalid_commits);
        assert!(options.reverse_order);
        assert_eq!(options.from_tag.as_deref(), Some("v1.0.0"));
        assert!(options.to_tag.is_none());
    }

    #[test]
    fn test_query_requires_url() {
        let err = ChangelogQuery::default().into_options().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(err.to_string(), "GitHub URL is required");
    }

    #[test]
    fn test_query_rejects_malformed_exclude_types() {
        let err = ChangelogQuery {
            exclude_types: Some("fix,docs".into()),
            ..query("https://github.com/x/y")
        }
        .into_options()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_post_defaults_are_overridden_by_options() {
        let request: ChangelogRequest = serde_json::from_str(
            r#"{"githubUrl":"https://github.com/x/y","options":{"useGitmojis":false,"excludeScopes":["deps"]}}"#,
        )
        .unwrap();
        let options = request.into_options().unwrap();

        assert_eq!(options.github_url, "https://github.com/x/y");
        assert!(options.include_ref_issues);
        assert!(!options.use_gitmojis);
        assert!(!options.include_invalid_commits);
        assert_eq!(options.exclude_scopes, vec!["deps"]);
    }

    #[test]
    fn test_post_requires_github_url() {
        let request: ChangelogRequest = serde_json::from_str(r#"{"options":{}}"#).unwrap();
        assert!(matches!(
            request.into_options(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer ghp_abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("ghp_abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
