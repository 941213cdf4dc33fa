use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Wrangler major version used when `wranglerVersion` is not supplied.
pub const DEFAULT_WRANGLER_VERSION: &str = "3";

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Inputs as they arrive from the runner, before validation.
///
/// Every field is optional here; `ActionConfig::from_inputs` decides which
/// ones are required.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub api_token: Option<String>,
    pub account_id: Option<String>,
    pub project_name: Option<String>,
    pub directory: Option<String>,
    pub github_token: Option<String>,
    pub branch: Option<String>,
    pub working_directory: Option<String>,
    pub wrangler_version: Option<String>,
    pub include_logs: Option<String>,
}

/// Validated configuration for one deploy run.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub api_token: String,
    pub account_id: String,
    pub project_name: String,
    pub directory: String,
    pub github_token: Option<String>,
    pub branch: Option<String>,
    /// Directory wrangler runs in, already resolved against the process cwd.
    pub working_directory: PathBuf,
    pub wrangler_version: String,
    pub include_logs: bool,
}

impl ActionConfig {
    /// Validate raw inputs. Required inputs are checked in the order the
    /// action documents them, so the first missing one is reported.
    pub fn from_inputs(raw: RawInputs, cwd: &Path) -> Result<Self, ConfigError> {
        let api_token = required(raw.api_token, "apiToken")?;
        let account_id = required(raw.account_id, "accountId")?;
        let project_name = required(raw.project_name, "projectName")?;
        let directory = required(raw.directory, "directory")?;

        // Always relative to cwd, even when written with a leading slash.
        let working_directory = match optional(raw.working_directory) {
            Some(dir) => cwd.join(dir.trim_start_matches(['/', '\\'])),
            None => cwd.to_path_buf(),
        };

        Ok(Self {
            api_token,
            account_id,
            project_name,
            directory,
            github_token: optional(raw.github_token),
            branch: optional(raw.branch),
            working_directory,
            wrangler_version: optional(raw.wrangler_version)
                .unwrap_or_else(|| DEFAULT_WRANGLER_VERSION.to_string()),
            include_logs: parse_boolean_input("includeLogs", raw.include_logs)?,
        })
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    optional(value).ok_or(ConfigError::MissingInput { name })
}

/// Parse a boolean input using the Actions core schema. Absent means false.
pub fn parse_boolean_input(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match optional(value).as_deref() {
        None => Ok(false),
        Some("true" | "True" | "TRUE") => Ok(true),
        Some("false" | "False" | "FALSE") => Ok(false),
        Some(_) => Err(ConfigError::InvalidBoolean { name }),
    }
}

/// `owner/repo` pair from `GITHUB_REPOSITORY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidRepository {
                value: value.to_string(),
            }),
        }
    }
}

/// The slice of the Actions runner environment a deploy run reads.
#[derive(Debug, Clone, Default)]
pub struct GitHubContext {
    pub head_ref: Option<String>,
    pub ref_name: Option<String>,
    pub git_ref: Option<String>,
    pub repository: Option<String>,
    pub api_url: String,
}

impl GitHubContext {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup. Empty values are
    /// treated as unset, matching how the runner leaves `GITHUB_HEAD_REF`
    /// empty outside pull requests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| optional(lookup(key));
        Self {
            head_ref: get("GITHUB_HEAD_REF"),
            ref_name: get("GITHUB_REF_NAME"),
            git_ref: get("GITHUB_REF"),
            repository: get("GITHUB_REPOSITORY"),
            api_url: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
        }
    }

    /// Branch the workflow runs for: the PR head branch, else the ref name.
    pub fn branch(&self) -> Option<&str> {
        self.head_ref.as_deref().or(self.ref_name.as_deref())
    }

    /// Ref a GitHub deployment is created against.
    pub fn deployment_ref(&self) -> Option<&str> {
        self.branch().or(self.git_ref.as_deref())
    }

    pub fn repo(&self) -> Result<RepoSlug, ConfigError> {
        let value = self
            .repository
            .as_deref()
            .ok_or(ConfigError::MissingEnvironment {
                var: "GITHUB_REPOSITORY",
            })?;
        RepoSlug::parse(value)
    }
}
