pub mod args;
pub mod config;
pub mod error;
pub mod gcloud;
pub mod prompt;
pub mod provisioner;
mod ui;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use mcp_deploy_api_client::{ApiEndpoints, CloudApi, GcpApiClient};
use mcp_deploy_common::{
    constants::{MESSAGES_PATH, REQUIRED_SERVICES, SECRET_ACCESSOR_ROLE, SSE_PATH},
    models::ProjectId,
    EnvFile,
};
use tracing::{debug, trace};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use crate::args::DeployArgs;
use crate::config::{DeploymentConfig, ServiceNowConfig};
use crate::error::EnvironmentError;
use crate::gcloud::{CloudSdk, GcloudCli};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::provisioner::{GrantOutcome, SecretProvisioner};
use crate::ui::Ui;

/// Send tracing output to stderr. `RUST_LOG` takes precedence over `debug`.
pub fn setup_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("info,mcp_deploy=trace,mcp_deploy_api_client=trace,mcp_deploy_common=trace")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(filter)
        .init();
}

/// Where the deployed MCP server can be reached
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub url: String,
    pub sse: String,
    pub messages: String,
}

impl ServiceEndpoints {
    pub fn from_url(url: &str) -> Self {
        let url = url.trim_end_matches('/');

        Self {
            url: url.to_owned(),
            sse: format!("{url}{SSE_PATH}"),
            messages: format!("{url}{MESSAGES_PATH}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Deployed(ServiceEndpoints),
    /// The operator declined the confirmation prompt
    Cancelled,
}

pub struct McpDeploy {
    sdk: Arc<dyn CloudSdk>,
    prompter: Arc<dyn Prompter>,
    /// Used instead of a client built from a fresh access token
    api: Option<Arc<dyn CloudApi>>,
}

impl Default for McpDeploy {
    fn default() -> Self {
        Self::new()
    }
}

impl McpDeploy {
    pub fn new() -> Self {
        Self::with_gcloud(GcloudCli::default())
    }

    /// Deploy through a specific gcloud installation, asking the terminal for confirmation
    pub fn with_gcloud(gcloud: GcloudCli) -> Self {
        Self {
            sdk: Arc::new(gcloud),
            prompter: Arc::new(TerminalPrompter),
            api: None,
        }
    }

    /// Swap the parts that talk to the outside world, e.g. for tests
    pub fn with_parts(
        sdk: Arc<dyn CloudSdk>,
        prompter: Arc<dyn Prompter>,
        api: Arc<dyn CloudApi>,
    ) -> Self {
        Self {
            sdk,
            prompter,
            api: Some(api),
        }
    }

    pub async fn run(&self, args: DeployArgs) -> Result<CommandOutcome> {
        trace!("running with {args:?}");
        let ui = Ui;
        ui.header(&format!("Deploying {} to Cloud Run", args.service_name));

        if !self.sdk.is_installed().await {
            return Err(EnvironmentError::MissingTool("gcloud").into());
        }

        let project = self.resolve_project(&args).await?;
        ui.step("☁️ ", format!("Project {project}, region {}", args.region));

        let servicenow = load_servicenow_config(&args.env_file)?;
        ui.step("📄", format!("Loaded settings from {}", args.env_file.display()));

        if args.skip_enable_apis {
            ui.info("Skipping API enablement");
        } else {
            ui.step("🔌", "Enabling required APIs");
            self.sdk.enable_services(&project, &REQUIRED_SERVICES).await?;
        }

        let api = self.api_client().await?;
        let provisioner = SecretProvisioner::new(api.as_ref());

        let project_info = api.get_project(&project).await?;
        if !project_info.is_active() {
            return Err(EnvironmentError::InactiveProject {
                project,
                state: project_info.lifecycle_state,
            }
            .into());
        }
        let principal = project_info.compute_principal();

        ui.step("🔐", format!("Storing password in secret '{}'", args.secret_name));
        let secret = provisioner
            .ensure_secret(&project, &args.secret_name, &servicenow.password)
            .await
            .with_context(|| format!("failed to provision secret '{}'", args.secret_name))?;

        let outcome = provisioner
            .grant_access(
                &project,
                &args.secret_name,
                principal.as_str(),
                SECRET_ACCESSOR_ROLE,
            )
            .await
            .with_context(|| format!("failed to grant {principal} access to the secret"))?;
        match outcome {
            GrantOutcome::Granted => ui.success(format!("Granted {principal} read access")),
            GrantOutcome::AlreadyGranted => ui.info(format!("{principal} already has read access")),
        }

        let config = DeploymentConfig::new(&args, project, &servicenow, secret);
        debug!(?config, "deployment config ready");

        if !args.yes
            && !self.prompter.confirm(&format!(
                "Deploy service '{}' to {} in project {}?",
                config.service_name, config.region, config.project
            ))?
        {
            ui.warn("Deployment cancelled. Nothing was deployed.");
            return Ok(CommandOutcome::Cancelled);
        }

        ui.step("🚀", "Deploying from source, this can take a few minutes");
        self.sdk
            .deploy(&config)
            .await
            .context("deployment failed")?;

        let endpoints = ServiceEndpoints::from_url(&self.sdk.service_url(&config).await?);
        print_endpoints(&endpoints);

        Ok(CommandOutcome::Deployed(endpoints))
    }

    async fn resolve_project(&self, args: &DeployArgs) -> Result<ProjectId> {
        if let Some(project) = &args.project {
            return Ok(project.clone());
        }

        let active = self
            .sdk
            .active_project()
            .await?
            .ok_or(EnvironmentError::UnresolvedProject)?;
        debug!(project = %active, "using active gcloud project");

        Ok(active.parse()?)
    }

    async fn api_client(&self) -> Result<Arc<dyn CloudApi>> {
        if let Some(api) = &self.api {
            return Ok(api.clone());
        }

        let token = self.sdk.access_token().await?;
        let client = GcpApiClient::new(token, ApiEndpoints::default(), None)?;

        Ok(Arc::new(client))
    }
}

fn load_servicenow_config(path: &Path) -> Result<ServiceNowConfig> {
    if !path.is_file() {
        return Err(EnvironmentError::MissingConfigFile(path.to_path_buf()).into());
    }

    let env = EnvFile::from_path(path)?;

    Ok(ServiceNowConfig::from_env_file(&env, path)?)
}

fn print_endpoints(endpoints: &ServiceEndpoints) {
    println!();
    println!("{}", "Deployment complete".green().bold());
    println!("  Service URL:       {}", endpoints.url);
    println!("  SSE endpoint:      {}", endpoints.sse);
    println!("  Messages endpoint: {}", endpoints.messages);
}
