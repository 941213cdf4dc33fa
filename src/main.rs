use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pages_deploy::actions::{ActionsRunner, set_failed};
use pages_deploy::cloudflare::CloudflareClient;
use pages_deploy::config::{ActionConfig, GitHubContext, RawInputs};
use pages_deploy::github::GitHubClient;
use pages_deploy::orchestrator::{self, Collaborators};
use pages_deploy::wrangler::Wrangler;

/// Every input can come from a flag or from the `INPUT_*` variable the
/// Actions runner sets for a step's `with:` block.
#[derive(Parser)]
#[command(name = "pages-deploy")]
#[command(version, about = "Deploy a static build to Cloudflare Pages")]
pub struct Cli {
    #[arg(short, long)]
    pub verbose: bool,

    /// Cloudflare API token with Pages edit permission
    #[arg(long, env = "INPUT_APITOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Cloudflare account id
    #[arg(long, env = "INPUT_ACCOUNTID")]
    pub account_id: Option<String>,

    /// Pages project name
    #[arg(long, env = "INPUT_PROJECTNAME")]
    pub project_name: Option<String>,

    /// Build output directory to upload
    #[arg(long, env = "INPUT_DIRECTORY")]
    pub directory: Option<String>,

    /// GitHub token; enables GitHub deployment records
    #[arg(long, env = "INPUT_GITHUBTOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Branch to deploy as, instead of the one wrangler detects
    #[arg(long, env = "INPUT_BRANCH")]
    pub branch: Option<String>,

    /// Directory to run wrangler in, relative to the current directory
    #[arg(long, env = "INPUT_WORKINGDIRECTORY")]
    pub working_directory: Option<String>,

    /// Wrangler version passed to npx
    #[arg(long, env = "INPUT_WRANGLERVERSION")]
    pub wrangler_version: Option<String>,

    /// Include deployment logs in the summary (true/false)
    #[arg(long, env = "INPUT_INCLUDELOGS")]
    pub include_logs: Option<String>,
}

impl From<Cli> for RawInputs {
    fn from(cli: Cli) -> Self {
        Self {
            api_token: cli.api_token,
            account_id: cli.account_id,
            project_name: cli.project_name,
            directory: cli.directory,
            github_token: cli.github_token,
            branch: cli.branch,
            working_directory: cli.working_directory,
            wrangler_version: cli.wrangler_version,
            include_logs: cli.include_logs,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

async fn deploy(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = ActionConfig::from_inputs(cli.into(), &cwd)?;
    let context = GitHubContext::from_env();
    let runner = ActionsRunner::from_env();

    let github = match &config.github_token {
        Some(token) => Some(GitHubClient::new(&context.api_url, token, context.repo()?)?),
        None => None,
    };
    let pages = CloudflareClient::new(&config.api_token, &config.account_id, &config.project_name)?;
    let wrangler = Wrangler::new();

    orchestrator::run(
        &config,
        &context,
        Collaborators {
            pages: &pages,
            deployer: &wrangler,
            github: github.as_ref(),
            runner: &runner,
        },
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = deploy(cli).await {
        tracing::error!("{:#}", e);
        set_failed(&e.to_string());
        std::process::exit(1);
    }
}
