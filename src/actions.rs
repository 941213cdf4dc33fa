//! GitHub Actions runner interop: step outputs, the job summary, and
//! workflow commands.
//!
//! Outputs go to the file named by `GITHUB_OUTPUT` in the heredoc format the
//! runner parses:
//!
//! ```text
//! name<<ghadelimiter_<uuid>
//! value
//! ghadelimiter_<uuid>
//! ```
//!
//! Without `GITHUB_OUTPUT` the legacy `::set-output` command is printed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{ConfigError, DeployError};

/// File-backed sinks the runner exposes to a step.
#[derive(Debug, Clone, Default)]
pub struct ActionsRunner {
    output_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

impl ActionsRunner {
    pub fn new(output_file: Option<PathBuf>, summary_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            summary_file,
        }
    }

    pub fn from_env() -> Self {
        let path = |key: &str| {
            std::env::var_os(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self::new(path("GITHUB_OUTPUT"), path("GITHUB_STEP_SUMMARY"))
    }

    pub fn set_output(&self, name: &str, value: &str) -> Result<(), DeployError> {
        match &self.output_file {
            Some(path) => append(path, &format_output(name, value)),
            None => {
                println!();
                println!("::set-output name={}::{}", name, escape_data(value));
                Ok(())
            }
        }
    }

    /// Append Markdown to the job summary.
    pub fn write_summary(&self, markdown: &str) -> Result<(), DeployError> {
        let path = self
            .summary_file
            .as_ref()
            .ok_or(ConfigError::MissingEnvironment {
                var: "GITHUB_STEP_SUMMARY",
            })?;
        append(path, markdown)
    }
}

fn append(path: &Path, contents: &str) -> Result<(), DeployError> {
    let io_err = |source| DeployError::RunnerFile {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)
}

/// One `GITHUB_OUTPUT` entry. The delimiter is random per entry so a value
/// can never terminate its own heredoc.
fn format_output(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Escape a workflow-command payload.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Print the `::error::` command that marks the step failed.
pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}
