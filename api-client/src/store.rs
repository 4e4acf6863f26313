use anyhow::Result;
use async_trait::async_trait;
use mcp_deploy_common::models::{
    secret::{SecretResponse, SecretVersionResponse},
    IamPolicy, ProjectId, ProjectResponse, SecretName,
};

/// Remote key-value store holding versioned secrets.
///
/// Errors carry an [`mcp_deploy_common::models::ApiError`] in their chain whenever the store
/// answered, so callers can branch on its [`mcp_deploy_common::models::ErrorKind`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` when no secret called `name` exists in `project`
    async fn get_secret(
        &self,
        project: &ProjectId,
        name: &SecretName,
    ) -> Result<Option<SecretResponse>>;

    /// Create an empty secret. Fails with `ALREADY_EXISTS` if it is already there.
    async fn create_secret(&self, project: &ProjectId, name: &SecretName)
        -> Result<SecretResponse>;

    /// Append `value` as the newest version. Older versions are left untouched.
    async fn add_secret_version(
        &self,
        project: &ProjectId,
        name: &SecretName,
        value: &[u8],
    ) -> Result<SecretVersionResponse>;

    async fn get_iam_policy(&self, project: &ProjectId, name: &SecretName) -> Result<IamPolicy>;

    /// Replace the policy. The policy etag must match the current one.
    async fn set_iam_policy(
        &self,
        project: &ProjectId,
        name: &SecretName,
        policy: IamPolicy,
    ) -> Result<IamPolicy>;
}

#[async_trait]
pub trait ProjectLookup: Send + Sync {
    async fn get_project(&self, project: &ProjectId) -> Result<ProjectResponse>;
}

/// Everything a deployment needs from the Google Cloud APIs
pub trait CloudApi: SecretStore + ProjectLookup {}

impl<T: SecretStore + ProjectLookup> CloudApi for T {}
