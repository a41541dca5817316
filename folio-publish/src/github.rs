#![doc = "GitHub contents API client: the production ContentStore behind the publishing workflow."]
//
//! # GitHub Content Store
//!
//! This module wires the [`ContentStore`] trait from `folio-publish-core` to the GitHub REST
//! contents API. It is the only code in the project that performs network I/O.
//!
//! - `exists` maps to `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}`; a 404 is
//!   reported as `Ok(None)`, an array body as a directory, an object body as a file with its
//!   blob SHA as revision token.
//! - `put_file` maps to `PUT /repos/{owner}/{repo}/contents/{path}` with base64 content and,
//!   for updates, the previous SHA. A 409 becomes [`StoreError::Conflict`].
//!
//! Every request carries the bearer token and is bounded by the configured timeout. There is
//! no retry.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

pub use folio_publish_core::contract::{ContentStore, PutFile, RemoteEntry, RevisionToken};
use folio_publish_core::error::{ConfigurationError, StoreError};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Connection settings for one repository and branch.
#[derive(Clone)]
pub struct GitHubSettings {
    pub api_base_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("api_base_url", &self.api_base_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

pub struct GitHubClient {
    http: Client,
    api_base: Url,
    settings: GitHubSettings,
}

impl GitHubClient {
    pub fn new(settings: GitHubSettings) -> Result<Self, ConfigurationError> {
        let api_base = Url::parse(&settings.api_base_url).map_err(|e| {
            tracing::error!(error = %e, url = %settings.api_base_url, "Invalid GitHub API base URL");
            ConfigurationError::Invalid {
                key: "repository.api_base_url".into(),
                message: e.to_string(),
            }
        })?;
        if api_base.cannot_be_a_base() {
            return Err(ConfigurationError::Invalid {
                key: "repository.api_base_url".into(),
                message: format!("{api_base} cannot be used as a base URL"),
            });
        }

        let http = Client::builder()
            .user_agent(concat!("folio-publish/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                key: "repository".into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        tracing::info!(
            owner = %settings.owner,
            repo = %settings.repo,
            branch = %settings.branch,
            api_base = %api_base,
            timeout_secs = settings.timeout.as_secs(),
            "Initialized GitHub client"
        );
        Ok(Self {
            http,
            api_base,
            settings,
        })
    }

    pub fn settings(&self) -> &GitHubSettings {
        &self.settings
    }

    /// `{api_base}/repos/{owner}/{repo}/contents/{path}` with every segment percent-encoded.
    pub fn contents_url(&self, path: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "repos",
                self.settings.owner.as_str(),
                self.settings.repo.as_str(),
                "contents",
            ]);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    fn transport_error(path: &str, e: reqwest::Error) -> StoreError {
        tracing::error!(error = %e, path, "GitHub request failed");
        StoreError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl ContentStore for GitHubClient {
    async fn exists(&self, path: &str) -> Result<Option<RemoteEntry>, StoreError> {
        let mut url = self.contents_url(path);
        url.query_pairs_mut().append_pair("ref", &self.settings.branch);
        tracing::debug!(path, "Looking up repository path");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.settings.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| Self::transport_error(path, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(path, "Path not found in repository");
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_error(path, e))?;
        if !status.is_success() {
            tracing::error!(path, status = %status, "GitHub lookup returned an error");
            return Err(status_error(path, status, &body));
        }
        parse_entry(path, &body).map(Some)
    }

    async fn put_file(&self, request: PutFile) -> Result<(), StoreError> {
        let path = request.path.as_str();
        tracing::info!(
            path,
            bytes = request.content.len(),
            update = request.revision.is_some(),
            "Committing file to GitHub"
        );
        let body = PutContentsBody {
            message: &request.message,
            content: STANDARD.encode(&request.content),
            branch: &self.settings.branch,
            sha: request.revision.as_ref().map(RevisionToken::as_str),
        };

        let response = self
            .http
            .put(self.contents_url(path))
            .bearer_auth(&self.settings.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(path, e))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(path, status = %status, "File committed");
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        tracing::error!(path, status = %status, "GitHub rejected the commit");
        Err(status_error(path, status, &text))
    }
}

/// Interprets a successful contents lookup body.
fn parse_entry(path: &str, body: &str) -> Result<RemoteEntry, StoreError> {
    let malformed = |message: String| StoreError::MalformedResponse {
        path: path.to_string(),
        message,
    };
    let value: Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    match value {
        Value::Array(_) => Ok(RemoteEntry::Directory),
        Value::Object(map) => match map.get("sha").and_then(Value::as_str) {
            Some(sha) => Ok(RemoteEntry::File {
                revision: RevisionToken::new(sha),
            }),
            None => Err(malformed("object without a sha".into())),
        },
        other => Err(malformed(format!("unexpected JSON {other}"))),
    }
}

/// Maps a non-success status to a [`StoreError`], keeping GitHub's own message when present.
fn status_error(path: &str, status: StatusCode, body: &str) -> StoreError {
    if status == StatusCode::CONFLICT {
        return StoreError::Conflict {
            path: path.to_string(),
        };
    }
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    StoreError::Status {
        path: path.to_string(),
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_base_url: &str) -> GitHubClient {
        GitHubClient::new(GitHubSettings {
            api_base_url: api_base_url.into(),
            owner: "agusalta".into(),
            repo: "portfolio".into(),
            branch: "main".into(),
            token: "t0ken".into(),
            timeout: Duration::from_secs(5),
        })
        .expect("client should build")
    }

    #[test]
    fn builds_contents_urls() {
        let client = client("https://api.github.com");
        assert_eq!(
            client.contents_url("public/assets/web-design/1.webp").as_str(),
            "https://api.github.com/repos/agusalta/portfolio/contents/public/assets/web-design/1.webp"
        );
    }

    #[test]
    fn percent_encodes_path_segments_and_keeps_base_prefix() {
        let client = client("https://ghe.example.com/api/v3/");
        assert_eq!(
            client.contents_url("/src/content/work/My File#1.md").as_str(),
            "https://ghe.example.com/api/v3/repos/agusalta/portfolio/contents/src/content/work/My%20File%231.md"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        let result = GitHubClient::new(GitHubSettings {
            api_base_url: "mailto:someone@example.com".into(),
            owner: "o".into(),
            repo: "r".into(),
            branch: "b".into(),
            token: "t".into(),
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));
    }

    #[test]
    fn parses_file_and_directory_entries() {
        assert_eq!(
            parse_entry("a.md", r#"{"type":"file","sha":"abc123","path":"a.md"}"#).unwrap(),
            RemoteEntry::File {
                revision: RevisionToken::new("abc123")
            }
        );
        assert_eq!(
            parse_entry("dir", r#"[{"type":"file","sha":"x"}]"#).unwrap(),
            RemoteEntry::Directory
        );
        assert!(matches!(
            parse_entry("a.md", "not json"),
            Err(StoreError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn maps_error_statuses() {
        assert_eq!(
            status_error("a.md", StatusCode::CONFLICT, ""),
            StoreError::Conflict {
                path: "a.md".into()
            }
        );
        assert_eq!(
            status_error(
                "a.md",
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"message":"\"sha\" wasn't supplied."}"#
            ),
            StoreError::Status {
                path: "a.md".into(),
                status: 422,
                message: "\"sha\" wasn't supplied.".into()
            }
        );
        assert_eq!(
            status_error("a.md", StatusCode::BAD_GATEWAY, " upstream down \n"),
            StoreError::Status {
                path: "a.md".into(),
                status: 502,
                message: "upstream down".into()
            }
        );
    }

    #[test]
    fn put_body_omits_sha_for_new_files() {
        let body = PutContentsBody {
            message: "Add PGWE1.md",
            content: STANDARD.encode(b"hi"),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "Add PGWE1.md", "content": "aGk=", "branch": "main"})
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", client("https://api.github.com").settings());
        assert!(!rendered.contains("t0ken"));
        assert!(rendered.contains("<redacted>"));
    }
}
