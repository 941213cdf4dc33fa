//! Cloudflare Pages API response types (subset of fields we use).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the stage whose completion resolves a deployment.
pub const DEPLOY_STAGE: &str = "deploy";

/// Stage status Cloudflare reports for a failed stage.
pub const STAGE_FAILURE: &str = "failure";

/// The v4 API envelope around every response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMessage {
    pub code: i64,
    pub message: String,
}

/// A Pages project.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub production_branch: Option<String>,
}

impl Project {
    /// True when either branch names the project's production branch.
    pub fn is_production(&self, github_branch: Option<&str>, branch_override: Option<&str>) -> bool {
        match self.production_branch.as_deref() {
            Some(production) => {
                github_branch == Some(production) || branch_override == Some(production)
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Stage {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub started_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TriggerMetadata {
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub commit_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeploymentTrigger {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: TriggerMetadata,
}

/// A Pages deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Deployment {
    pub id: String,
    pub url: String,
    pub environment: String,
    /// Cloudflare sends `null` rather than `[]` when there are no aliases.
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub deployment_trigger: DeploymentTrigger,
}

impl Deployment {
    pub fn deploy_stage(&self) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.name == DEPLOY_STAGE)
    }

    /// The deploy stage has ended, successfully or not.
    pub fn is_resolved(&self) -> bool {
        self.deploy_stage()
            .is_some_and(|stage| stage.ended_on.is_some())
    }

    /// First eight characters of the source commit, or empty when unknown.
    pub fn short_commit(&self) -> String {
        self.deployment_trigger
            .metadata
            .commit_hash
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(8)
            .collect()
    }

    /// URL reported as the alias: the canonical URL for production, else the
    /// first branch alias when one exists.
    pub fn alias_url(&self, production: bool) -> &str {
        if production {
            return &self.url;
        }
        self.aliases
            .as_deref()
            .and_then(|aliases| aliases.first())
            .map(String::as_str)
            .unwrap_or(self.url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogLine {
    pub ts: DateTime<Utc>,
    pub line: String,
}

/// Log lines for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LogBundle {
    #[serde(default)]
    pub data: Vec<LogLine>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub includes_container_logs: bool,
}

impl LogBundle {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The history-logs `result`: a single bundle, or a list whose first entry wins.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LogsResult {
    Many(Vec<LogBundle>),
    One(LogBundle),
}

impl LogsResult {
    pub fn into_first(self) -> LogBundle {
        match self {
            LogsResult::Many(bundles) => bundles.into_iter().next().unwrap_or_default(),
            LogsResult::One(bundle) => bundle,
        }
    }
}
