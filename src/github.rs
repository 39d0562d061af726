use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, LINK, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::GithubError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub name: Option<String>,
}

impl User {
    /// Display name, falling back to the login when the profile has none.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub default_branch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// Raw blob or file payload as the API delivers it.
#[derive(Debug, Clone, Deserialize)]
pub struct Blob {
    pub content: String,
    pub encoding: String,
}

impl Blob {
    /// Decoded text of a base64 blob, or `None` for other encodings and
    /// content that is not valid UTF-8.
    pub fn text(&self) -> Result<Option<String>, GithubError> {
        if self.encoding != "base64" {
            return Ok(None);
        }
        let bytes = decode_base64(&self.content).map_err(|source| GithubError::Decode {
            what: "blob".to_string(),
            source,
        })?;
        Ok(String::from_utf8(bytes).ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekActivity {
    pub total: u64,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

/// The API wraps base64 payloads at 60 columns.
pub fn decode_base64(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Extracts the `rel="next"` target from a `Link` header.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_owned)
    })
}

/// Everything the screener needs to know about an account and its repositories.
#[async_trait]
pub trait RepoSource: Send + Sync {
    async fn user(&self, login: &str) -> Result<User, GithubError>;
    async fn repos(&self, login: &str) -> Result<Vec<Repository>, GithubError>;
    async fn languages(&self, full_name: &str) -> Result<BTreeMap<String, u64>, GithubError>;
    async fn readme(&self, full_name: &str) -> Result<Option<String>, GithubError>;
    async fn tree(&self, full_name: &str, branch: &str) -> Result<Vec<TreeEntry>, GithubError>;
    async fn blob(&self, full_name: &str, sha: &str) -> Result<Blob, GithubError>;
    async fn commit_activity(&self, full_name: &str) -> Result<Vec<WeekActivity>, GithubError>;
}

/// `base` with `segments` appended, each percent-encoded as a single path
/// segment so `#`, `?`, `%` and `/` in a branch name cannot change the route.
pub fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Error for a non-success response, preferring the API's own `message`.
pub fn status_error(status: StatusCode, path: &str, body: &str) -> GithubError {
    if status == StatusCode::UNAUTHORIZED {
        return GithubError::Unauthorized;
    }

    let message = serde_json::from_str::<ApiMessage>(body)
        .ok()
        .and_then(|m| m.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("API Error").to_string());

    GithubError::Status {
        status: status.as_u16(),
        path: path.to_string(),
        message,
    }
}

/// Weekly totals from a commit-activity response. 202 (still computing),
/// 204 and an empty object all mean no data.
pub fn commit_activity_from(status: StatusCode, body: &str) -> Vec<WeekActivity> {
    if matches!(status, StatusCode::ACCEPTED | StatusCode::NO_CONTENT) || body.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(body).unwrap_or_default()
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    base_url: Arc<Url>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a REST client for `base_url` authenticated with `token`.
    pub fn new(token: impl Into<String>, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("Invalid API URL '{base_url}'"))?;
        if base.cannot_be_a_base() {
            bail!("Invalid API URL '{base_url}'");
        }
        Ok(Self::from_parts(token, base, Client::new()))
    }

    fn from_parts(token: impl Into<String>, base_url: Url, http: Client) -> Self {
        Self {
            token: Arc::new(token.into()),
            base_url: Arc::new(base_url),
            http: Arc::new(http),
        }
    }

    /// `/repos/{owner}/{name}/...` for a `owner/name` full name.
    fn repo_endpoint(&self, full_name: &str, rest: &[&str]) -> Url {
        let mut segments = vec!["repos"];
        segments.extend(full_name.split('/'));
        segments.extend_from_slice(rest);
        endpoint(&self.base_url, &segments)
    }

    /// Low-level GET. Non-success statuses become errors via [`status_error`].
    async fn send(&self, url: Url) -> Result<Response, GithubError> {
        debug!(%url, "GET");
        let path = url.path().to_string();
        let resp = self
            .http
            .get(url)
            .bearer_auth(&*self.token)
            .header(USER_AGENT, concat!("gh-screener/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| GithubError::Network {
                path: path.clone(),
                source,
            })?;

        let status = resp.status();
        trace!(%path, status = status.as_u16(), "response");
        if status.is_success() {
            return Ok(resp);
        }

        // Error payloads are JSON with a `message`, but don't insist on it.
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, &path, &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GithubError> {
        let path = url.path().to_string();
        let resp = self.send(url).await?;
        resp.json()
            .await
            .map_err(|source| GithubError::Network { path, source })
    }
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn user(&self, login: &str) -> Result<User, GithubError> {
        match self.get_json(endpoint(&self.base_url, &["users", login])).await {
            Err(GithubError::Status { status: 404, .. }) => {
                Err(GithubError::UserNotFound(login.to_string()))
            }
            other => other,
        }
    }

    /// All public repositories, following `Link` pagination.
    async fn repos(&self, login: &str) -> Result<Vec<Repository>, GithubError> {
        let mut first = endpoint(&self.base_url, &["users", login, "repos"]);
        first
            .query_pairs_mut()
            .append_pair("type", "owner")
            .append_pair("per_page", &PER_PAGE.to_string());

        let mut out = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            let path = url.path().to_string();
            let resp = self.send(url).await?;
            next = resp
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link)
                .and_then(|link| Url::parse(&link).ok());

            let page: Vec<Repository> = resp
                .json()
                .await
                .map_err(|source| GithubError::Network { path, source })?;
            debug!(count = page.len(), more = next.is_some(), "fetched repository page");
            out.extend(page);
        }

        Ok(out)
    }

    async fn languages(&self, full_name: &str) -> Result<BTreeMap<String, u64>, GithubError> {
        self.get_json(self.repo_endpoint(full_name, &["languages"]))
            .await
    }

    async fn readme(&self, full_name: &str) -> Result<Option<String>, GithubError> {
        let file: Blob = match self.get_json(self.repo_endpoint(full_name, &["readme"])).await {
            Ok(file) => file,
            Err(GithubError::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let bytes = decode_base64(&file.content).map_err(|source| GithubError::Decode {
            what: format!("README of {full_name}"),
            source,
        })?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    async fn tree(&self, full_name: &str, branch: &str) -> Result<Vec<TreeEntry>, GithubError> {
        let mut url = self.repo_endpoint(full_name, &["git", "trees", branch]);
        url.query_pairs_mut().append_pair("recursive", "1");

        let tree: TreeResponse = self.get_json(url).await?;
        if tree.truncated {
            debug!(repo = full_name, "tree listing truncated by the API");
        }
        Ok(tree.tree)
    }

    async fn blob(&self, full_name: &str, sha: &str) -> Result<Blob, GithubError> {
        self.get_json(self.repo_endpoint(full_name, &["git", "blobs", sha]))
            .await
    }

    /// Weekly commit totals for the last year.
    async fn commit_activity(&self, full_name: &str) -> Result<Vec<WeekActivity>, GithubError> {
        let url = self.repo_endpoint(full_name, &["stats", "commit_activity"]);
        let path = url.path().to_string();
        let resp = self.send(url).await?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| GithubError::Network { path, source })?;

        let weeks = commit_activity_from(status, &body);
        if weeks.is_empty() {
            debug!(repo = full_name, status = status.as_u16(), "no commit activity");
        }
        Ok(weeks)
    }
}
