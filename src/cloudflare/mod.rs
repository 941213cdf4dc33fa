//! Cloudflare Pages API client.
//!
//! Only the three reads a deploy run needs: the project, the project's
//! deployment list, and one deployment's history logs. `PagesApi` is the seam
//! the poller and the orchestrator depend on.

pub mod types;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error};

use crate::errors::DeployError;
pub use types::{Deployment, LogBundle, LogLine, Project, Stage};
use types::{ApiEnvelope, LogsResult};

pub const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";

const USER_AGENT: &str = concat!("pages-deploy/", env!("CARGO_PKG_VERSION"));

/// Reads against the Pages API for one project.
#[async_trait]
pub trait PagesApi: Send + Sync {
    async fn get_project(&self) -> Result<Project, DeployError>;

    async fn list_deployments(&self) -> Result<Vec<Deployment>, DeployError>;

    async fn deployment_logs(&self, deployment_id: &str) -> Result<LogBundle, DeployError>;
}

/// Authenticated client scoped to one account and project.
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
    account_id: String,
    project_name: String,
    api_token: String,
}

impl CloudflareClient {
    pub fn new(api_token: &str, account_id: &str, project_name: &str) -> Result<Self, DeployError> {
        Self::with_base_url(CLOUDFLARE_API_URL, api_token, account_id, project_name)
    }

    /// Client against a non-default API root (tests point this at a local server).
    pub fn with_base_url(
        base_url: &str,
        api_token: &str,
        account_id: &str,
        project_name: &str,
    ) -> Result<Self, DeployError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_id: account_id.to_string(),
            project_name: project_name.to_string(),
            api_token: api_token.to_string(),
        })
    }

    fn project_url(&self) -> String {
        format!(
            "{}/accounts/{}/pages/projects/{}",
            self.base_url, self.account_id, self.project_name
        )
    }

    async fn get(&self, url: &str, action: &'static str) -> Result<reqwest::Response, DeployError> {
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        ensure_ok(resp, action).await
    }
}

/// Pass through a 200 response; log status and body of anything else.
async fn ensure_ok(
    resp: reqwest::Response,
    action: &'static str,
) -> Result<reqwest::Response, DeployError> {
    let status = resp.status();
    if status == StatusCode::OK {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    error!(status = status.as_u16(), "Cloudflare API returned non-200");
    error!("API returned: {}", body);
    Err(DeployError::UpstreamStatus {
        action,
        status: status.as_u16(),
    })
}

#[async_trait]
impl PagesApi for CloudflareClient {
    async fn get_project(&self) -> Result<Project, DeployError> {
        let envelope: ApiEnvelope<Project> = self
            .get(&self.project_url(), "get Pages project")
            .await?
            .json()
            .await?;
        envelope.result.ok_or_else(|| DeployError::ProjectNotFound {
            project: self.project_name.clone(),
        })
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>, DeployError> {
        let url = format!("{}/deployments", self.project_url());
        let envelope: ApiEnvelope<Vec<Deployment>> = self
            .get(&url, "list Pages deployments")
            .await?
            .json()
            .await?;
        if !envelope.success {
            debug!(errors = ?envelope.errors, "deployment list reported success=false");
        }
        Ok(envelope.result.unwrap_or_default())
    }

    async fn deployment_logs(&self, deployment_id: &str) -> Result<LogBundle, DeployError> {
        let url = format!(
            "{}/deployments/{}/history/logs",
            self.project_url(),
            deployment_id
        );
        let envelope: ApiEnvelope<LogsResult> = self
            .get(&url, "get Pages Deployment Logs")
            .await?
            .json()
            .await?;
        Ok(envelope
            .result
            .map(LogsResult::into_first)
            .unwrap_or_default())
    }
}
