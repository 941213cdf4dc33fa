//! GitHub Deployments API: one deployment record per run, plus a status once
//! the Pages deployment has resolved.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::RepoSlug;
use crate::errors::DeployError;

const USER_AGENT: &str = concat!("pages-deploy/", env!("CARGO_PKG_VERSION"));
const DESCRIPTION: &str = "Cloudflare Pages";

/// Body of `POST /repos/{owner}/{repo}/deployments`.
#[derive(Debug, Serialize)]
pub struct CreateDeployment<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
    pub auto_merge: bool,
    pub description: &'a str,
    pub required_contexts: Vec<String>,
    pub environment: &'a str,
    pub production_environment: bool,
}

/// A deployment record (subset of fields).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubDeployment {
    pub id: i64,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub environment: String,
    #[serde(default)]
    pub production_environment: bool,
}

/// Body of `POST /repos/{owner}/{repo}/deployments/{id}/statuses`.
#[derive(Debug, Serialize)]
pub struct CreateDeploymentStatus<'a> {
    pub state: &'a str,
    pub environment: &'a str,
    pub environment_url: &'a str,
    pub log_url: &'a str,
    pub description: &'a str,
    pub auto_inactive: bool,
}

/// Link to a Pages deployment in the Cloudflare dashboard.
pub fn dashboard_url(account_id: &str, project_name: &str, deployment_id: &str) -> String {
    format!("https://dash.cloudflare.com/{account_id}/pages/view/{project_name}/{deployment_id}")
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    repo: RepoSlug,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str, repo: RepoSlug) -> Result<Self, DeployError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            repo,
        })
    }

    fn deployments_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/deployments",
            self.api_url, self.repo.owner, self.repo.repo
        )
    }

    fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(body)
    }

    /// Create a deployment record. Anything but `201 Created` yields `None`:
    /// GitHub answers `202` when an auto-merge ran instead, and the record is
    /// best-effort either way.
    pub async fn create_deployment(
        &self,
        git_ref: &str,
        environment: &str,
        production_environment: bool,
    ) -> Result<Option<GitHubDeployment>, DeployError> {
        let body = CreateDeployment {
            git_ref,
            auto_merge: false,
            description: DESCRIPTION,
            required_contexts: Vec::new(),
            environment,
            production_environment,
        };
        let resp = self.post(&self.deployments_url(), &body).send().await?;

        if resp.status() != StatusCode::CREATED {
            warn!(
                status = resp.status().as_u16(),
                "GitHub did not create a deployment; skipping deployment status"
            );
            return Ok(None);
        }

        let deployment: GitHubDeployment = resp.json().await?;
        info!(id = deployment.id, %environment, "Created GitHub deployment");
        Ok(Some(deployment))
    }

    /// Mark a deployment record `success`. Non-2xx responses are errors.
    pub async fn create_deployment_status(
        &self,
        deployment_id: i64,
        status: &CreateDeploymentStatus<'_>,
    ) -> Result<(), DeployError> {
        let url = format!("{}/{}/statuses", self.deployments_url(), deployment_id);
        let resp = self.post(&url, status).send().await?;

        let code = resp.status();
        if !code.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = code.as_u16(), "GitHub API returned non-2xx");
            error!("API returned: {}", body);
            return Err(DeployError::UpstreamStatus {
                action: "create GitHub deployment status",
                status: code.as_u16(),
            });
        }

        info!(deployment_id, state = status.state, "Created GitHub deployment status");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── client ───────────────────────────────────────────────────────

    #[test]
    fn test_client_accepts_any_token_and_builds_repo_urls() {
        let client = GitHubClient::new(
            "https://ghe.internal/api/v3/",
            "plain-installation-token",
            RepoSlug {
                owner: "octo".to_string(),
                repo: "site".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            client.deployments_url(),
            "https://ghe.internal/api/v3/repos/octo/site/deployments"
        );
    }

    // ── request bodies ───────────────────────────────────────────────

    #[test]
    fn test_create_deployment_body() {
        let body = CreateDeployment {
            git_ref: "feature/x",
            auto_merge: false,
            description: DESCRIPTION,
            required_contexts: Vec::new(),
            environment: "site (Preview)",
            production_environment: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ref"], "feature/x");
        assert_eq!(json["auto_merge"], false);
        assert_eq!(json["required_contexts"], serde_json::json!([]));
        assert_eq!(json["environment"], "site (Preview)");
        assert_eq!(json["production_environment"], false);
        assert_eq!(json["description"], "Cloudflare Pages");
    }

    #[test]
    fn test_create_deployment_status_body() {
        let log_url = dashboard_url("acct1", "site", "dep-1");
        let body = CreateDeploymentStatus {
            state: "success",
            environment: "site (Production)",
            environment_url: "https://abc123.site.pages.dev",
            log_url: &log_url,
            description: DESCRIPTION,
            auto_inactive: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["state"], "success");
        assert_eq!(json["auto_inactive"], false);
        assert_eq!(
            json["log_url"],
            "https://dash.cloudflare.com/acct1/pages/view/site/dep-1"
        );
    }

    // ── GitHubDeployment deserialization ─────────────────────────────

    #[test]
    fn test_github_deployment_deserialize() {
        let json = r#"{
            "id": 1234,
            "ref": "main",
            "sha": "a84d88e7554fc1fa21bcbc4efae3c782a70d2b9d",
            "environment": "site (Production)",
            "production_environment": true,
            "description": "Cloudflare Pages"
        }"#;
        let deployment: GitHubDeployment = serde_json::from_str(json).unwrap();
        assert_eq!(deployment.id, 1234);
        assert_eq!(deployment.git_ref, "main");
        assert!(deployment.production_environment);
    }

    #[test]
    fn test_deployments_url() {
        let client = GitHubClient::new(
            "https://api.github.com/",
            "ghs_x",
            RepoSlug {
                owner: "octo".to_string(),
                repo: "site".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            client.deployments_url(),
            "https://api.github.com/repos/octo/site/deployments"
        );
    }
}
