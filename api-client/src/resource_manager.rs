use anyhow::{Context, Result};
use async_trait::async_trait;
use mcp_deploy_common::models::{ProjectId, ProjectResponse};

use crate::{GcpApiClient, ProjectLookup};

#[async_trait]
impl ProjectLookup for GcpApiClient {
    async fn get_project(&self, project: &ProjectId) -> Result<ProjectResponse> {
        let url = format!("{}/v1/projects/{project}", self.endpoints.resource_manager);

        self.get_json(url)
            .await
            .with_context(|| format!("failed to look up project '{project}'"))
    }
}
