//! Status derivation, log fetching and the job-summary report.

use std::fmt::Write as _;
use tracing::debug;

use crate::cloudflare::types::STAGE_FAILURE;
use crate::cloudflare::{Deployment, LogBundle, PagesApi};
use crate::errors::DeployError;

pub const SUCCESS_MARKER: &str = "✅  Deploy successful!";
pub const FAILURE_MARKER: &str = "🚫  Deployment failed";

/// Outcome shown in the summary. A deploy stage that is missing or still
/// running counts as success; only an explicit `failure` status fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Success,
    Failure,
}

impl DeploymentStatus {
    pub fn of(deployment: &Deployment) -> Self {
        match deployment.deploy_stage() {
            Some(stage) if stage.status == STAGE_FAILURE => DeploymentStatus::Failure,
            _ => DeploymentStatus::Success,
        }
    }

    pub fn is_failure(self) -> bool {
        self == DeploymentStatus::Failure
    }

    pub fn marker(self) -> &'static str {
        match self {
            DeploymentStatus::Success => SUCCESS_MARKER,
            DeploymentStatus::Failure => FAILURE_MARKER,
        }
    }
}

/// Log lines for the summary.
///
/// A deployment that did not fail returns an empty bundle whenever logs were
/// requested, without calling the API. Every other combination reads the
/// history-logs endpoint.
pub async fn fetch_logs(
    api: &dyn PagesApi,
    deployment: &Deployment,
    failure: bool,
    include_logs: bool,
) -> Result<LogBundle, DeployError> {
    if !failure && include_logs {
        debug!("skipping log fetch for successful deployment");
        return Ok(LogBundle::empty());
    }
    api.deployment_logs(&deployment.id).await
}

/// Markdown written to the job summary.
pub fn render_summary(
    deployment: &Deployment,
    alias_url: &str,
    status: &str,
    logs: &LogBundle,
) -> String {
    let mut out = format!(
        "
# Deploying with Cloudflare Pages

| Name                    | Result |
| ----------------------- | - |
| **Last commit:**        | `{commit}` |
| **Status**:             | {status} |
| **Preview URL**:        | {url} |
| **Branch Preview URL**: | {alias} |
",
        commit = deployment.short_commit(),
        status = status,
        url = deployment.url,
        alias = alias_url,
    );

    if logs.total > 0 && !logs.data.is_empty() {
        out.push_str("\n<details>\n<summary>Deployment logs</summary>\n\n```\n");
        for message in &logs.data {
            let _ = writeln!(out, "{} {}", message.ts.to_rfc3339(), message.line);
        }
        out.push_str("```\n\n</details>\n");
    }

    out
}
