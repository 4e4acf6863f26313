//! Secret Manager v1 REST calls

use anyhow::{Context, Result};
use async_trait::async_trait;
use mcp_deploy_common::models::{
    iam::SetIamPolicyRequest,
    secret::{AddSecretVersionRequest, CreateSecretRequest, SecretResponse, SecretVersionResponse},
    ErrorKind, IamPolicy, ProjectId, SecretName,
};

use crate::util::api_error_kind;
use crate::{GcpApiClient, SecretStore};

/// Newest policy schema version. Requesting it keeps conditional bindings intact on write back.
const REQUESTED_POLICY_VERSION: u8 = 3;

impl GcpApiClient {
    fn secrets_url(&self, project: &ProjectId) -> String {
        format!(
            "{}/v1/projects/{project}/secrets",
            self.endpoints.secret_manager
        )
    }

    fn secret_url(&self, project: &ProjectId, name: &SecretName) -> String {
        format!("{}/{name}", self.secrets_url(project))
    }
}

#[async_trait]
impl SecretStore for GcpApiClient {
    async fn get_secret(
        &self,
        project: &ProjectId,
        name: &SecretName,
    ) -> Result<Option<SecretResponse>> {
        match self.get_json(self.secret_url(project, name)).await {
            Ok(secret) => Ok(Some(secret)),
            Err(e) if api_error_kind(&e) == Some(ErrorKind::NotFound) => Ok(None),
            Err(e) => Err(e.context(format!("failed to look up secret '{name}'"))),
        }
    }

    async fn create_secret(
        &self,
        project: &ProjectId,
        name: &SecretName,
    ) -> Result<SecretResponse> {
        let url = format!("{}?secretId={name}", self.secrets_url(project));

        self.post_json(url, &CreateSecretRequest::default())
            .await
            .with_context(|| format!("failed to create secret '{name}'"))
    }

    async fn add_secret_version(
        &self,
        project: &ProjectId,
        name: &SecretName,
        value: &[u8],
    ) -> Result<SecretVersionResponse> {
        let url = format!("{}:addVersion", self.secret_url(project, name));

        self.post_json(url, &AddSecretVersionRequest::new(value))
            .await
            .with_context(|| format!("failed to add a version to secret '{name}'"))
    }

    async fn get_iam_policy(&self, project: &ProjectId, name: &SecretName) -> Result<IamPolicy> {
        let url = format!(
            "{}:getIamPolicy?options.requestedPolicyVersion={REQUESTED_POLICY_VERSION}",
            self.secret_url(project, name)
        );

        self.get_json(url)
            .await
            .with_context(|| format!("failed to read the IAM policy of secret '{name}'"))
    }

    async fn set_iam_policy(
        &self,
        project: &ProjectId,
        name: &SecretName,
        policy: IamPolicy,
    ) -> Result<IamPolicy> {
        let url = format!("{}:setIamPolicy", self.secret_url(project, name));

        self.post_json(url, &SetIamPolicyRequest { policy })
            .await
            .with_context(|| format!("failed to update the IAM policy of secret '{name}'"))
    }
}
