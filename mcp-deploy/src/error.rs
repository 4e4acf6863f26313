use std::path::PathBuf;

use mcp_deploy_common::models::{project::LifecycleState, ProjectId};

/// Problems with the operator's machine or inputs, found before or between remote calls
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("`{0}` was not found. Install the Google Cloud SDK: https://cloud.google.com/sdk/docs/install")]
    MissingTool(&'static str),
    #[error("Configuration file not found at {}", .0.display())]
    MissingConfigFile(PathBuf),
    #[error(
        "No Google Cloud project is set. Pass `--project <id>` or run `gcloud config set project <id>`"
    )]
    UnresolvedProject,
    #[error("Project {project} is {state}. Only ACTIVE projects can be deployed to")]
    InactiveProject {
        project: ProjectId,
        state: LifecycleState,
    },
    #[error("Missing required keys in {}: {}", .path.display(), .keys.join(", "))]
    MissingKeys { path: PathBuf, keys: Vec<&'static str> },
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
