//! The parts of a deployment that go through the `gcloud` command line tool

use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use mcp_deploy_common::{models::ProjectId, Secret};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::DeploymentConfig;

pub const GCLOUD: &str = "gcloud";
/// Lets callers hand over a token instead of asking gcloud for one
const ACCESS_TOKEN_ENV: &str = "CLOUDSDK_AUTH_ACCESS_TOKEN";
/// Candidates for gcloud's `^D^` list delimiter escape, tried in order
const ALT_DELIMITERS: [char; 4] = ['|', ';', '@', '~'];

#[async_trait]
pub trait CloudSdk: Send + Sync {
    async fn is_installed(&self) -> bool;
    /// Project of the active gcloud configuration, if one is set
    async fn active_project(&self) -> Result<Option<String>>;
    async fn access_token(&self) -> Result<Secret<String>>;
    async fn enable_services(&self, project: &ProjectId, services: &[&str]) -> Result<()>;
    /// Build the sources and roll out a new revision
    async fn deploy(&self, config: &DeploymentConfig) -> Result<()>;
    async fn service_url(&self, config: &DeploymentConfig) -> Result<String>;
}

/// [`CloudSdk`] backed by the real `gcloud` binary
#[derive(Clone, Debug)]
pub struct GcloudCli {
    program: String,
}

impl Default for GcloudCli {
    fn default() -> Self {
        Self::new(GCLOUD)
    }
}

impl GcloudCli {
    /// Use `program` in place of the `gcloud` found on `PATH`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Prefer a token handed over by the caller, then ask gcloud for one
    async fn access_token_or(&self, provided: Option<String>) -> Result<Secret<String>> {
        if let Some(token) = provided.filter(|t| !t.is_empty()) {
            debug!("using access token from {ACCESS_TOKEN_ENV}");
            return Ok(Secret::new(token));
        }

        let token = self
            .output(["auth", "print-access-token"])
            .await
            .context("failed to get an access token. Run `gcloud auth login` first")?;
        if token.is_empty() {
            bail!("gcloud returned an empty access token. Run `gcloud auth login` first");
        }

        Ok(Secret::new(token))
    }

    /// Run gcloud to completion and return its trimmed stdout
    async fn output<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(args).stdin(Stdio::null());
        trace!(?command, "running gcloud");

        let output = command
            .output()
            .await
            .with_context(|| format!("failed to run `{}`", self.program))?;

        if !output.status.success() {
            bail!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

#[async_trait]
impl CloudSdk for GcloudCli {
    async fn is_installed(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn active_project(&self) -> Result<Option<String>> {
        let project = self.output(["config", "get-value", "project"]).await?;

        Ok(parse_config_value(&project))
    }

    async fn access_token(&self) -> Result<Secret<String>> {
        self.access_token_or(std::env::var(ACCESS_TOKEN_ENV).ok()).await
    }

    async fn enable_services(&self, project: &ProjectId, services: &[&str]) -> Result<()> {
        let mut args = vec!["services", "enable"];
        args.extend_from_slice(services);
        args.extend(["--project", project.as_str()]);

        self.output(args)
            .await
            .context("failed to enable the required Google Cloud APIs")?;

        Ok(())
    }

    async fn deploy(&self, config: &DeploymentConfig) -> Result<()> {
        let args = deploy_args(config)?;
        debug!(service = %config.service_name, region = %config.region, "deploying");

        // inherit stdio so build progress reaches the operator
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .await
            .with_context(|| format!("failed to run `{}`", self.program))?;

        if !status.success() {
            bail!("`{} run deploy` exited with {status}", self.program);
        }

        Ok(())
    }

    async fn service_url(&self, config: &DeploymentConfig) -> Result<String> {
        let url = self
            .output([
                "run",
                "services",
                "describe",
                config.service_name.as_str(),
                "--region",
                config.region.as_str(),
                "--project",
                config.project.as_str(),
                "--format",
                "value(status.url)",
            ])
            .await
            .context("failed to read the service url")?;

        if url.is_empty() {
            return Err(anyhow!("service '{}' has no url yet", config.service_name));
        }

        Ok(url)
    }
}

/// `gcloud config get-value` prints nothing or `(unset)` for missing values
fn parse_config_value(raw: &str) -> Option<String> {
    match raw.trim() {
        "" | "(unset)" => None,
        value => Some(value.to_owned()),
    }
}

/// Arguments for `gcloud run deploy`, without the program name
pub fn deploy_args(config: &DeploymentConfig) -> Result<Vec<String>> {
    let mut args: Vec<String> = vec![
        "run".into(),
        "deploy".into(),
        config.service_name.clone(),
        "--source".into(),
        config.source.display().to_string(),
        "--region".into(),
        config.region.clone(),
        "--project".into(),
        config.project.to_string(),
        "--platform".into(),
        "managed".into(),
        "--port".into(),
        config.port.to_string(),
    ];

    args.push(if config.allow_unauthenticated {
        "--allow-unauthenticated".into()
    } else {
        "--no-allow-unauthenticated".into()
    });

    if !config.env_vars.is_empty() {
        let pairs: Vec<_> = config
            .env_vars
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        args.push("--set-env-vars".into());
        args.push(join_list(&pairs)?);
    }

    if !config.secrets.is_empty() {
        let pairs: Vec<_> = config
            .secrets
            .iter()
            .map(|(key, secret)| format!("{key}={secret}"))
            .collect();
        args.push("--set-secrets".into());
        args.push(join_list(&pairs)?);
    }

    // already confirmed by the operator
    args.push("--quiet".into());

    Ok(args)
}

/// Join items into a gcloud list flag value, switching the delimiter when an item has a comma
fn join_list(items: &[String]) -> Result<String> {
    if !items.iter().any(|item| item.contains(',')) {
        return Ok(items.join(","));
    }

    let delimiter = ALT_DELIMITERS
        .into_iter()
        .find(|d| !items.iter().any(|item| item.contains(*d)))
        .context("values contain every supported list delimiter")?;

    let separator = delimiter.to_string();
    Ok(format!("^{delimiter}^{}", items.join(separator.as_str())))
}
