//! GitHub fetch collaborators for a repository-search UI.
//!
//! Two [`Fetcher`] implementations over the GitHub REST API: repository
//! search ([`RepoSearch`]) and per-repository issue listing ([`IssueList`]).
//! The issue list is the natural dependent query — its key derives from
//! whichever repository the user selects in the search results.
//!
//! Non-success responses are rejected with a message extracted from
//! GitHub's structured error payload (`errors[0].message`, else the
//! top-level `message`), falling back to a generic description.
//!
//! The API root is configurable so tests can point these at a mock server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::key::{ParamValue, QueryKey};
use crate::traits::Fetcher;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// User-Agent sent with every request; GitHub rejects requests without one.
const AGENT: &str = concat!("requery/", env!("CARGO_PKG_VERSION"));

/// Search term a fresh UI starts from.
pub const DEFAULT_QUERY: &str = "@facebook";

/// Freshness window for both queries (one minute).
pub const STALE_TIME: Duration = Duration::from_secs(60);

/// Retention for unobserved repository-search entries.
pub const SEARCH_GC_TIME: Duration = Duration::from_secs(30);

/// Retention for unobserved issue-list entries.
pub const ISSUES_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// A repository from the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub language: Option<String>,
    pub updated_at: String,
    pub owner: Owner,
}

/// Repository owner.
#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// An issue from the issues endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<Repository>,
}

/// Structured GitHub error payload; both shapes the API uses.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Repository search collaborator (`GET /search/repositories`).
///
/// Expects keys shaped [`RepoSearch::key()`]: `repositories[query, sort]`.
/// An empty `sort` means best match and is omitted from the request, like
/// the upstream API's default.
pub struct RepoSearch {
    http: reqwest::Client,
    base_url: String,
}

impl RepoSearch {
    /// Collaborator against the public GitHub API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Collaborator against a different API root (mock server, proxy).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Build the query key for a search term and sort order.
    pub fn key(query: &str, sort: &str) -> QueryKey {
        QueryKey::new("repositories").param(query).param(sort)
    }
}

impl Default for RepoSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher<Vec<Repository>> for RepoSearch {
    async fn fetch(&self, key: &QueryKey) -> Result<Vec<Repository>, FetchError> {
        let (query, sort) = search_params(key)?;
        let mut request = self
            .http
            .get(format!("{}/search/repositories", self.base_url))
            .header(USER_AGENT, AGENT)
            .query(&[("q", query)]);
        if !sort.is_empty() {
            request = request.query(&[("sort", sort)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::new(format!("search request failed: {e}")))?;
        let response = reject_failure(response, "Failed to fetch repositories").await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::new(format!("malformed search response: {e}")))?;
        debug!(query, count = body.items.len(), "repository search completed");
        Ok(body.items)
    }
}

/// Issue list collaborator (`GET /repos/{owner}/{repo}/issues`).
///
/// Expects keys shaped [`IssueList::key()`]: `issues[owner, repo]`.
pub struct IssueList {
    http: reqwest::Client,
    base_url: String,
}

impl IssueList {
    /// Collaborator against the public GitHub API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Collaborator against a different API root (mock server, proxy).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Build the query key for a repository's issue list.
    pub fn key(owner: &str, repo: &str) -> QueryKey {
        QueryKey::new("issues").param(owner).param(repo)
    }
}

impl Default for IssueList {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher<Vec<Issue>> for IssueList {
    async fn fetch(&self, key: &QueryKey) -> Result<Vec<Issue>, FetchError> {
        let (owner, repo) = issue_params(key)?;
        let response = self
            .http
            .get(format!("{}/repos/{owner}/{repo}/issues", self.base_url))
            .header(USER_AGENT, AGENT)
            .send()
            .await
            .map_err(|e| FetchError::new(format!("issues request failed: {e}")))?;
        let response = reject_failure(response, "Failed to fetch repository issues").await?;
        let issues: Vec<Issue> = response
            .json()
            .await
            .map_err(|e| FetchError::new(format!("malformed issues response: {e}")))?;
        debug!(owner, repo, count = issues.len(), "issue list completed");
        Ok(issues)
    }
}

fn search_params(key: &QueryKey) -> Result<(&str, &str), FetchError> {
    match key.params() {
        [ParamValue::Text(query), ParamValue::Text(sort)] => Ok((query, sort)),
        _ => Err(FetchError::new(format!("unexpected search key shape: {key}"))),
    }
}

fn issue_params(key: &QueryKey) -> Result<(&str, &str), FetchError> {
    match key.params() {
        [ParamValue::Text(owner), ParamValue::Text(repo)] => Ok((owner, repo)),
        _ => Err(FetchError::new(format!("unexpected issues key shape: {key}"))),
    }
}

/// Reject a non-success response, extracting a structured message when the
/// body carries one.
async fn reject_failure(
    response: reqwest::Response,
    generic: &str,
) -> Result<reqwest::Response, FetchError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::new(extract_error_message(&body, generic)))
}

fn extract_error_message(body: &str, generic: &str) -> String {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload
            .errors
            .into_iter()
            .next()
            .map(|e| e.message)
            .or(payload.message)
            .unwrap_or_else(|| generic.to_owned()),
        Err(_) => generic.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_errors_array() {
        let body = r#"{"message":"Validation Failed","errors":[{"message":"query is too long"}]}"#;
        assert_eq!(extract_error_message(body, "generic"), "query is too long");
    }

    #[test]
    fn error_message_falls_back_to_top_level() {
        let body = r#"{"message":"API rate limit exceeded"}"#;
        assert_eq!(
            extract_error_message(body, "generic"),
            "API rate limit exceeded"
        );
    }

    #[test]
    fn error_message_generic_on_unstructured_body() {
        assert_eq!(extract_error_message("<html>503</html>", "generic"), "generic");
        assert_eq!(extract_error_message("", "generic"), "generic");
    }

    #[test]
    fn search_key_shape() {
        let key = RepoSearch::key("react", "stars");
        assert_eq!(key.name(), "repositories");
        let (query, sort) = search_params(&key).unwrap();
        assert_eq!((query, sort), ("react", "stars"));
    }

    #[test]
    fn issue_key_shape() {
        let key = IssueList::key("facebook", "react");
        let (owner, repo) = issue_params(&key).unwrap();
        assert_eq!((owner, repo), ("facebook", "react"));
    }

    #[test]
    fn wrong_key_shape_is_rejected() {
        let key = QueryKey::new("repositories").param("react");
        assert!(search_params(&key).is_err());
    }
}
