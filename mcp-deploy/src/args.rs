use std::{ffi::OsString, io, path::PathBuf};

use clap::{
    builder::{OsStringValueParser, TypedValueParser},
    Parser,
};
use mcp_deploy_common::{
    constants::{DEFAULT_ENV_FILE, DEFAULT_REGION, DEFAULT_SECRET_NAME, DEFAULT_SERVICE_NAME},
    models::{ProjectId, SecretName},
};

use crate::gcloud::GCLOUD;

/// Deploy the ServiceNow MCP server to Google Cloud Run.
///
/// The ServiceNow password is stored in Secret Manager and injected into the
/// service by reference. Every other setting is passed as an environment variable.
#[derive(Parser, Clone, Debug)]
#[command(version, name = "mcp-deploy")]
pub struct DeployArgs {
    /// Google Cloud project to deploy into (default: the active gcloud project)
    #[arg(long, env = "CLOUDSDK_CORE_PROJECT")]
    pub project: Option<ProjectId>,
    /// Cloud Run region
    #[arg(long, env = "CLOUDSDK_RUN_REGION", default_value = DEFAULT_REGION)]
    pub region: String,
    /// Name of the Cloud Run service
    #[arg(long, env = "MCP_DEPLOY_SERVICE_NAME", default_value = DEFAULT_SERVICE_NAME)]
    pub service_name: String,
    /// File holding the ServiceNow connection settings
    #[arg(long, env = "MCP_DEPLOY_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,
    /// Directory with the server sources to build
    #[arg(long, default_value = ".", value_parser = OsStringValueParser::new().try_map(parse_path))]
    pub source: PathBuf,
    /// Secret Manager secret that holds the ServiceNow password
    #[arg(long, env = "MCP_DEPLOY_SECRET_NAME", default_value = DEFAULT_SECRET_NAME)]
    pub secret_name: SecretName,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y', env = "MCP_DEPLOY_YES")]
    pub yes: bool,
    /// Do not try to enable the required Google Cloud APIs
    #[arg(long)]
    pub skip_enable_apis: bool,
    /// Require authentication on the deployed service
    #[arg(long)]
    pub no_allow_unauthenticated: bool,
    /// The gcloud executable to run
    #[arg(long, env = "MCP_DEPLOY_GCLOUD", default_value = GCLOUD)]
    pub gcloud: String,
    /// Turn on tracing output. (WARNING: prints request urls and gcloud invocations)
    #[arg(long, env = "MCP_DEPLOY_DEBUG")]
    pub debug: bool,
}

/// Helper function to parse and return the absolute path
fn parse_path(path: OsString) -> Result<PathBuf, io::Error> {
    dunce::canonicalize(&path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("could not turn {path:?} into a real path: {e}"),
        )
    })
}
