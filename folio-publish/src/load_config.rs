/// `load_config` module: merges the static YAML layout file with secrets from the environment
/// into the [`AppConfig`] every other component receives at construction.
///
/// # Responsibilities
/// - Parse the optional YAML file (repository, layout and server sections, all optional)
/// - Read `GITHUB_TOKEN`, `GITHUB_REPO`, `GITHUB_BRANCH` and `GITHUB_OWNER` from the environment
/// - Fail with a [`ConfigurationError`] before anything is served when a required value is
///   missing
///
/// Nothing outside this module reads the environment.
///
/// # Errors
/// All errors are `anyhow::Error`; configuration problems wrap a [`ConfigurationError`] that
/// callers can downcast to.
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use folio_publish_core::config::PublishConfig;
use folio_publish_core::error::ConfigurationError;
use serde::Deserialize;
use tracing::{error, info};

use crate::github::GitHubSettings;

pub const DEFAULT_OWNER: &str = "agusalta";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub repository: RepositorySection,
    pub layout: PublishConfig,
    pub server: ServerSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RepositorySection {
    pub owner: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    pub max_body_bytes: usize,
}

/// Fully merged configuration, injected into the publisher and the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub github: GitHubSettings,
    pub publish: PublishConfig,
    pub server: ServerSettings,
}

/// Loads the YAML file at `path` (defaults when `None`) and injects secrets from the process
/// environment.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<AppConfig> {
    let file_config = match path {
        Some(path) => read_file_config(path.as_ref())?,
        None => {
            info!("No config file given, using default layout");
            FileConfig::default()
        }
    };
    let config = merge(file_config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    match serde_yaml::from_str::<Option<FileConfig>>(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Combines the static file with secrets looked up through `lookup`.
///
/// `GITHUB_REPO` may be `repo` or `owner/repo`. The owner is taken from `GITHUB_OWNER`, then
/// from the `owner/` prefix of `GITHUB_REPO`, then from `repository.owner`.
pub fn merge(
    file: FileConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigurationError> {
    let required = |key: &'static str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                error!(variable = key, "Required environment variable missing");
                ConfigurationError::MissingVariable(key)
            })
    };

    let token = required("GITHUB_TOKEN")?;
    let repo_raw = required("GITHUB_REPO")?;
    let branch = required("GITHUB_BRANCH")?;

    let (repo_owner, repo) = match repo_raw.split_once('/') {
        Some((owner, repo)) => (Some(owner.to_string()), repo.to_string()),
        None => (None, repo_raw),
    };
    let owner = lookup("GITHUB_OWNER")
        .filter(|v| !v.trim().is_empty())
        .or(repo_owner)
        .unwrap_or(file.repository.owner);

    let bind: SocketAddr = file
        .server
        .bind
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigurationError::Invalid {
            key: "server.bind".into(),
            message: e.to_string(),
        })?;

    info!(
        owner = %owner,
        repo = %repo,
        branch = %branch,
        token_set = !token.is_empty(),
        "Config loaded and merged successfully"
    );
    file.layout.trace_loaded();

    Ok(AppConfig {
        github: GitHubSettings {
            api_base_url: file.repository.api_base_url,
            owner,
            repo,
            branch,
            token,
            timeout: Duration::from_secs(file.repository.timeout_secs),
        },
        publish: file.layout,
        server: ServerSettings {
            bind,
            max_body_bytes: file.server.max_body_bytes,
        },
    })
}
