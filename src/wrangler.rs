//! Deploy invoker: runs `wrangler pages deploy` and pulls the deployment URL
//! out of its output.

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ActionConfig;
use crate::errors::DeployError;

// First `https:` run up to whitespace. wrangler prints the deployment URL
// before the alias URL, so the first match is the one the poller looks up.
static DEPLOYMENT_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https:\S+").unwrap());

/// Everything a deploy CLI needs for one upload.
#[derive(Debug, Clone)]
pub struct DeployRequest<'a> {
    pub api_token: &'a str,
    pub account_id: &'a str,
    pub project_name: &'a str,
    pub directory: &'a str,
    pub branch: Option<&'a str>,
    pub wrangler_version: &'a str,
    pub working_directory: &'a Path,
}

impl<'a> DeployRequest<'a> {
    pub fn from_config(config: &'a ActionConfig) -> Self {
        Self {
            api_token: &config.api_token,
            account_id: &config.account_id,
            project_name: &config.project_name,
            directory: &config.directory,
            branch: config.branch.as_deref(),
            wrangler_version: &config.wrangler_version,
            working_directory: &config.working_directory,
        }
    }
}

/// Uploads a build and returns the CLI's captured stdout.
#[async_trait]
pub trait DeployCommand: Send + Sync {
    async fn deploy(&self, request: &DeployRequest<'_>) -> Result<String, DeployError>;
}

/// `npx wrangler@<version> pages deploy`.
pub struct Wrangler {
    program: String,
}

impl Default for Wrangler {
    fn default() -> Self {
        Self::new()
    }
}

impl Wrangler {
    pub fn new() -> Self {
        Self {
            program: "npx".to_string(),
        }
    }

    /// Arguments passed to `npx`.
    pub fn args(request: &DeployRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "--yes".to_string(),
            format!("wrangler@{}", request.wrangler_version),
            "pages".to_string(),
            "deploy".to_string(),
            request.directory.to_string(),
            format!("--project-name={}", request.project_name),
        ];
        if let Some(branch) = request.branch {
            args.push(format!("--branch={}", branch));
        }
        args
    }
}

#[async_trait]
impl DeployCommand for Wrangler {
    async fn deploy(&self, request: &DeployRequest<'_>) -> Result<String, DeployError> {
        let args = Self::args(request);
        info!(
            dir = %request.working_directory.display(),
            "Running {} {}",
            self.program,
            args.join(" ")
        );

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(request.working_directory)
            .env("CLOUDFLARE_API_TOKEN", request.api_token)
            .env("CLOUDFLARE_ACCOUNT_ID", request.account_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| DeployError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stdout.lines() {
            info!("{}", line);
        }
        if !stderr.trim().is_empty() {
            warn!("wrangler stderr: {}", stderr.trim());
        }

        if !output.status.success() {
            return Err(DeployError::CliFailed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        debug!(bytes = stdout.len(), "wrangler finished");
        Ok(stdout)
    }
}

/// First `https:` URL in the deploy CLI's output.
pub fn extract_deployment_url(output: &str) -> Option<String> {
    DEPLOYMENT_URL_REGEX
        .find(output)
        .map(|m| m.as_str().to_string())
}

/// Run the deploy CLI and return the deployment URL it reports.
pub async fn deploy_and_extract_url(
    command: &dyn DeployCommand,
    request: &DeployRequest<'_>,
) -> Result<String, DeployError> {
    let stdout = command.deploy(request).await?;
    extract_deployment_url(&stdout).ok_or(DeployError::DeploymentUrlMissing)
}
