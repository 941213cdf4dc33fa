//! The deploy run: project lookup, wrangler upload, polling, reporting and
//! GitHub correlation, strictly in that order.

use tracing::{info, warn};

use crate::actions::ActionsRunner;
use crate::cloudflare::{Deployment, PagesApi};
use crate::config::{ActionConfig, GitHubContext};
use crate::errors::DeployError;
use crate::github::{CreateDeploymentStatus, GitHubClient, GitHubDeployment, dashboard_url};
use crate::poller::wait_for_deployment;
use crate::report::{DeploymentStatus, fetch_logs, render_summary};
use crate::wrangler::{DeployCommand, DeployRequest, deploy_and_extract_url};

/// External systems a run talks to.
pub struct Collaborators<'a> {
    pub pages: &'a dyn PagesApi,
    pub deployer: &'a dyn DeployCommand,
    /// Present only when a GitHub token was supplied.
    pub github: Option<&'a GitHubClient>,
    pub runner: &'a ActionsRunner,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub deployment: Deployment,
    pub production: bool,
    pub environment_name: String,
    pub alias_url: String,
    pub status: DeploymentStatus,
    pub github_deployment: Option<GitHubDeployment>,
}

pub fn environment_name(project_name: &str, production: bool) -> String {
    let kind = if production { "Production" } else { "Preview" };
    format!("{project_name} ({kind})")
}

pub async fn run(
    config: &ActionConfig,
    context: &GitHubContext,
    deps: Collaborators<'_>,
) -> Result<DeployOutcome, DeployError> {
    let project = deps.pages.get_project().await?;
    let production = project.is_production(context.branch(), config.branch.as_deref());
    let environment_name = environment_name(&config.project_name, production);
    info!(project = %project.name, %environment_name, "Found Pages project");

    let github_deployment = match deps.github {
        Some(github) => match context.deployment_ref() {
            Some(git_ref) => {
                github
                    .create_deployment(git_ref, &environment_name, production)
                    .await?
            }
            None => {
                warn!("No branch or ref in the runner environment; skipping GitHub deployment");
                None
            }
        },
        None => None,
    };

    let request = DeployRequest::from_config(config);
    let url = deploy_and_extract_url(deps.deployer, &request).await?;
    info!(%url, "wrangler reported deployment");
    let deployment = wait_for_deployment(deps.pages, &url).await?;

    deps.runner.set_output("id", &deployment.id)?;
    deps.runner.set_output("url", &deployment.url)?;
    deps.runner.set_output("environment", &deployment.environment)?;
    let alias_url = deployment.alias_url(production).to_string();
    deps.runner.set_output("alias", &alias_url)?;

    let status = DeploymentStatus::of(&deployment);
    let logs = fetch_logs(deps.pages, &deployment, status.is_failure(), config.include_logs).await?;
    deps.runner
        .write_summary(&render_summary(&deployment, &alias_url, status.marker(), &logs))?;

    if let (Some(github), Some(record)) = (deps.github, &github_deployment) {
        let log_url = dashboard_url(&config.account_id, &config.project_name, &deployment.id);
        // Always "success", even when the Pages deploy stage failed.
        let body = CreateDeploymentStatus {
            state: "success",
            environment: &environment_name,
            environment_url: &alias_url,
            log_url: &log_url,
            description: "Cloudflare Pages",
            auto_inactive: false,
        };
        github.create_deployment_status(record.id, &body).await?;
    }

    info!(id = %deployment.id, status = status.marker(), "Deployment finished");
    Ok(DeployOutcome {
        deployment,
        production,
        environment_name,
        alias_url,
        status,
        github_deployment,
    })
}
