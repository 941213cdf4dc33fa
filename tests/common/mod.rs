//! Shared fixtures: an axum server standing in for the Cloudflare and GitHub
//! APIs, and a scripted deploy command.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use pages_deploy::errors::DeployError;
use pages_deploy::wrangler::{DeployCommand, DeployRequest};

pub const DEPLOYMENT_URL: &str = "https://abc123.site.pages.dev";
pub const WRANGLER_OUTPUT: &str = "✨ Success! Uploaded 4 files (1.02 sec)\n\n\
    ✨ Deployment complete! Take a peek over at https://abc123.site.pages.dev\n\
    ✨ Deployment alias URL: https://feature.site.pages.dev\n";

/// Canned responses plus a log of every request the server saw.
pub struct MockApi {
    pub project: Value,
    pub project_status: StatusCode,
    pub deployments: Value,
    pub deployments_status: StatusCode,
    pub logs: Value,
    pub logs_status: StatusCode,
    pub github_deployment_status: StatusCode,
    pub github_status_status: StatusCode,
    pub requests: Mutex<Vec<String>>,
    pub github_bodies: Mutex<Vec<Value>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            project: json!({"id": "p1", "name": "site", "production_branch": "main"}),
            project_status: StatusCode::OK,
            deployments: json!([deployment_json(DEPLOYMENT_URL, "success", &["https://feature.site.pages.dev"])]),
            deployments_status: StatusCode::OK,
            logs: json!({
                "total": 1,
                "includes_container_logs": false,
                "data": [{"ts": "2024-05-01T10:00:00Z", "line": "Success: Assets published!"}]
            }),
            logs_status: StatusCode::OK,
            github_deployment_status: StatusCode::CREATED,
            github_status_status: StatusCode::CREATED,
            requests: Mutex::new(Vec::new()),
            github_bodies: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    fn record(&self, line: String) {
        self.requests.lock().unwrap().push(line);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn github_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.contains("/repos/"))
            .collect()
    }

    pub fn github_bodies(&self) -> Vec<Value> {
        self.github_bodies.lock().unwrap().clone()
    }
}

pub fn deployment_json(url: &str, deploy_status: &str, aliases: &[&str]) -> Value {
    json!({
        "id": "dep-1",
        "url": url,
        "environment": "preview",
        "aliases": aliases,
        "stages": [
            {"name": "queued", "status": "success", "ended_on": "2024-05-01T09:59:58Z"},
            {"name": "deploy", "status": deploy_status, "started_on": "2024-05-01T09:59:59Z", "ended_on": "2024-05-01T10:00:02Z"}
        ],
        "deployment_trigger": {
            "type": "ad_hoc",
            "metadata": {"branch": "feature", "commit_hash": "0123456789abcdef0123", "commit_message": "Update"}
        }
    })
}

type Shared = State<Arc<MockApi>>;

fn envelope(result: Value) -> Json<Value> {
    Json(json!({"success": true, "errors": [], "messages": [], "result": result}))
}

async fn project(State(api): Shared, Path((account, project)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
    api.record(format!("GET /accounts/{account}/pages/projects/{project}"));
    (api.project_status, envelope(api.project.clone()))
}

async fn deployments(
    State(api): Shared,
    Path((account, project)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    api.record(format!("GET /accounts/{account}/pages/projects/{project}/deployments"));
    (api.deployments_status, envelope(api.deployments.clone()))
}

async fn logs(
    State(api): Shared,
    Path((_account, _project, id)): Path<(String, String, String)>,
) -> (StatusCode, Json<Value>) {
    api.record(format!("GET logs {id}"));
    (api.logs_status, envelope(api.logs.clone()))
}

async fn create_deployment(
    State(api): Shared,
    Path((owner, repo)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    api.record(format!("POST /repos/{owner}/{repo}/deployments"));
    let response = json!({
        "id": 42,
        "ref": body["ref"],
        "environment": body["environment"],
        "production_environment": body["production_environment"],
    });
    api.github_bodies.lock().unwrap().push(body);
    (api.github_deployment_status, Json(response))
}

async fn create_status(
    State(api): Shared,
    Path((owner, repo, id)): Path<(String, String, i64)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    api.record(format!("POST /repos/{owner}/{repo}/deployments/{id}/statuses"));
    api.github_bodies.lock().unwrap().push(body);
    (api.github_status_status, Json(json!({"id": 1, "state": "success"})))
}

fn router(api: Arc<MockApi>) -> Router {
    Router::new()
        .route("/client/v4/accounts/{account}/pages/projects/{project}", get(project))
        .route(
            "/client/v4/accounts/{account}/pages/projects/{project}/deployments",
            get(deployments),
        )
        .route(
            "/client/v4/accounts/{account}/pages/projects/{project}/deployments/{id}/history/logs",
            get(logs),
        )
        .route("/repos/{owner}/{repo}/deployments", post(create_deployment))
        .route("/repos/{owner}/{repo}/deployments/{id}/statuses", post(create_status))
        .with_state(api)
}

/// Serve `api` on a random localhost port and return its base URL, or `None`
/// when the sandbox forbids binding.
pub async fn serve(api: Arc<MockApi>) -> Option<String> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Skipping test (cannot bind mock server): {e}");
            return None;
        }
    };
    let addr = listener.local_addr().ok()?;
    let app = router(api);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Mock server error: {e}");
        }
    });
    Some(format!("http://{addr}"))
}

/// Deploy command that prints a fixed output and counts invocations.
pub struct ScriptedWrangler {
    output: String,
    calls: AtomicU32,
}

impl ScriptedWrangler {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeployCommand for ScriptedWrangler {
    async fn deploy(&self, request: &DeployRequest<'_>) -> Result<String, DeployError> {
        assert_eq!(request.project_name, "site");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}
