//! Typed error hierarchy for a deploy run.
//!
//! Two enums cover the run:
//! - `ConfigError` — inputs and runner environment, raised before any network call
//! - `DeployError` — everything after configuration, including wrapped `ConfigError`s
//!
//! `DeployError::category` folds every variant into one of four reporting buckets.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while collecting inputs or reading the runner environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Input required and not supplied: {name}")]
    MissingInput { name: &'static str },

    #[error(
        "Input does not meet YAML 1.2 \"Core Schema\" specification: {name}\n\
         Support boolean input list: `true | True | TRUE | false | False | FALSE`"
    )]
    InvalidBoolean { name: &'static str },

    #[error("Unable to find environment variable for ${var}")]
    MissingEnvironment { var: &'static str },

    #[error("GITHUB_REPOSITORY must look like 'owner/repo', got '{value}'")]
    InvalidRepository { value: String },
}

/// Reporting bucket for a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Upstream,
    Data,
    Timeout,
}

/// Errors from a deploy run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to {action}, API returned non-200 ({status})")]
    UpstreamStatus { action: &'static str, status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("wrangler exited with code {exit_code}: {stderr}")]
    CliFailed { exit_code: i32, stderr: String },

    #[error("Failed to get Pages project, project does not exist. Check the project name or create it!")]
    ProjectNotFound { project: String },

    #[error("Failed to get deployment from Cloudflare API: no deployment with url {url}")]
    DeploymentNotFound { url: String },

    #[error("Failed to get deployment URL from wrangler output")]
    DeploymentUrlMissing,

    #[error("Failed to get deployment from Cloudflare API: deploy stage did not finish after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Failed to write {path}: {source}")]
    RunnerFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeployError::Config(_) | DeployError::RunnerFile { .. } => ErrorCategory::Configuration,
            DeployError::UpstreamStatus { .. }
            | DeployError::Http(_)
            | DeployError::SpawnFailed { .. }
            | DeployError::CliFailed { .. } => ErrorCategory::Upstream,
            DeployError::ProjectNotFound { .. }
            | DeployError::DeploymentNotFound { .. }
            | DeployError::DeploymentUrlMissing => ErrorCategory::Data,
            DeployError::Timeout { .. } => ErrorCategory::Timeout,
        }
    }
}
