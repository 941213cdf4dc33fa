//! Waits for a Pages deployment's `deploy` stage to finish.
//!
//! The budget is fixed: five lookups, two seconds apart, no backoff. A deploy
//! stage that ended in failure ends the wait exactly like a successful one;
//! telling the two apart is left to `report::DeploymentStatus`.

use std::time::Duration;
use tracing::{debug, info};

use crate::cloudflare::{Deployment, PagesApi};
use crate::errors::DeployError;

pub const MAX_ATTEMPTS: u32 = 5;
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Find the deployment with exactly this URL. A missing deployment is an
/// error straight away, not a reason to retry.
pub async fn fetch_deployment(api: &dyn PagesApi, url: &str) -> Result<Deployment, DeployError> {
    api.list_deployments()
        .await?
        .into_iter()
        .find(|deployment| deployment.url == url)
        .ok_or_else(|| DeployError::DeploymentNotFound {
            url: url.to_string(),
        })
}

/// Poll until the deployment at `url` has a finished deploy stage.
pub async fn wait_for_deployment(api: &dyn PagesApi, url: &str) -> Result<Deployment, DeployError> {
    for attempt in 1..=MAX_ATTEMPTS {
        let deployment = fetch_deployment(api, url).await?;
        if deployment.is_resolved() {
            debug!(attempt, id = %deployment.id, "deploy stage finished");
            return Ok(deployment);
        }

        info!(attempt, "Waiting for deployment to finish...");
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Err(DeployError::Timeout {
        attempts: MAX_ATTEMPTS,
    })
}
