use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use mcp_deploy::{config::DeploymentConfig, gcloud::CloudSdk};
use mcp_deploy_common::{models::ProjectId, Secret};

/// Fake `gcloud` that records what it was asked to do
pub struct RecordingSdk {
    installed: bool,
    active_project: Option<String>,
    url: String,
    fail_deploy: bool,
    enabled_services: Mutex<Vec<String>>,
    deployments: Mutex<Vec<DeploymentConfig>>,
}

impl Default for RecordingSdk {
    fn default() -> Self {
        Self {
            installed: true,
            active_project: None,
            url: "https://servicenow-mcp-abc123-uc.a.run.app".to_owned(),
            fail_deploy: false,
            enabled_services: Mutex::default(),
            deployments: Mutex::default(),
        }
    }
}

impl RecordingSdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_installed(mut self) -> Self {
        self.installed = false;
        self
    }

    pub fn with_active_project(mut self, project: &str) -> Self {
        self.active_project = Some(project.to_owned());
        self
    }

    pub fn failing_deploy(mut self) -> Self {
        self.fail_deploy = true;
        self
    }

    pub fn enabled_services(&self) -> Vec<String> {
        self.enabled_services.lock().unwrap().clone()
    }

    pub fn deployments(&self) -> Vec<DeploymentConfig> {
        self.deployments.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudSdk for RecordingSdk {
    async fn is_installed(&self) -> bool {
        self.installed
    }

    async fn active_project(&self) -> Result<Option<String>> {
        Ok(self.active_project.clone())
    }

    async fn access_token(&self) -> Result<Secret<String>> {
        Ok(Secret::new("test-token".to_owned()))
    }

    async fn enable_services(&self, _project: &ProjectId, services: &[&str]) -> Result<()> {
        self.enabled_services
            .lock()
            .unwrap()
            .extend(services.iter().map(|s| s.to_string()));
        Ok(())
    }

    async fn deploy(&self, config: &DeploymentConfig) -> Result<()> {
        if self.fail_deploy {
            bail!("build failed");
        }

        self.deployments.lock().unwrap().push(config.clone());
        Ok(())
    }

    async fn service_url(&self, _config: &DeploymentConfig) -> Result<String> {
        Ok(self.url.clone())
    }
}
