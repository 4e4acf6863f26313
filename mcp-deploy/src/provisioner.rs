//! Idempotent provisioning of the secret a deployment reads its password from.

use anyhow::{bail, Context, Result};
use mcp_deploy_api_client::{util::api_error_kind, SecretStore};
use mcp_deploy_common::{
    models::{ErrorKind, Principal, ProjectId, SecretName, SecretRef},
    Secret,
};
use tracing::{debug, info};

/// Whether [`SecretProvisioner::grant_access`] had to change the policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted,
    AlreadyGranted,
}

pub struct SecretProvisioner<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: SecretStore + ?Sized> SecretProvisioner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Store `value` as the newest version of `name`, creating the secret first if needed.
    ///
    /// Older versions stay readable by their version number. When two callers race, both
    /// versions are written and the later one becomes `latest`.
    pub async fn ensure_secret(
        &self,
        project: &ProjectId,
        name: &SecretName,
        value: &Secret<String>,
    ) -> Result<SecretRef> {
        if value.is_empty() {
            bail!("refusing to store an empty value in secret '{name}'");
        }

        if self.store.get_secret(project, name).await?.is_some() {
            debug!(%name, "secret exists, adding a new version");
        } else {
            debug!(%name, "secret not found, creating it");
            match self.store.create_secret(project, name).await {
                Ok(_) => info!(%name, %project, "created secret"),
                // created by someone else since the lookup
                Err(e) if api_error_kind(&e) == Some(ErrorKind::AlreadyExists) => {
                    debug!(%name, "secret appeared after lookup, adding a new version")
                }
                Err(e) => return Err(e),
            }
        }

        let version = self
            .store
            .add_secret_version(project, name, value.expose().as_bytes())
            .await?;
        info!(%name, version = version.version_id(), "stored new secret version");

        Ok(SecretRef::latest(name.clone()))
    }

    /// Give `principal` the `role` on secret `name`. Does not write when it already has it.
    pub async fn grant_access(
        &self,
        project: &ProjectId,
        name: &SecretName,
        principal: &str,
        role: &str,
    ) -> Result<GrantOutcome> {
        let principal: Principal = principal
            .parse()
            .context("refusing to grant access to a malformed principal")?;

        let mut policy = self.store.get_iam_policy(project, name).await?;
        if !policy.add_member(role, &principal) {
            debug!(%principal, role, %name, "principal already bound");
            return Ok(GrantOutcome::AlreadyGranted);
        }

        self.store.set_iam_policy(project, name, policy).await?;
        info!(%principal, role, %name, "granted access");

        Ok(GrantOutcome::Granted)
    }
}
