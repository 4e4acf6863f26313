use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use http::StatusCode;
use mcp_deploy_api_client::{ProjectLookup, SecretStore};
use mcp_deploy_common::models::{
    project::LifecycleState,
    secret::{SecretResponse, SecretVersionResponse, SecretVersionState},
    ApiError, ErrorKind, IamPolicy, ProjectId, ProjectResponse, SecretName,
};

/// Calls a [`MemorySecretStore`] can receive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSecret,
    CreateSecret,
    AddSecretVersion,
    GetIamPolicy,
    SetIamPolicy,
    GetProject,
}

#[derive(Default)]
struct StoredSecret {
    versions: Vec<Vec<u8>>,
    policy: IamPolicy,
    etag: u64,
}

#[derive(Default)]
struct State {
    projects: HashMap<String, (String, LifecycleState)>,
    secrets: BTreeMap<(String, String), StoredSecret>,
    failures: HashMap<Operation, ErrorKind>,
    create_race: bool,
    calls: Vec<Operation>,
}

/// In-memory stand-in for Secret Manager and Resource Manager
#[derive(Default)]
pub struct MemorySecretStore {
    state: Mutex<State>,
}

fn key(project: &ProjectId, name: &SecretName) -> (String, String) {
    (project.to_string(), name.to_string())
}

fn etag(counter: u64) -> String {
    format!("etag-{counter}")
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project so it can be looked up by id
    pub fn with_project(self, project: &str, number: &str) -> Self {
        self.with_project_state(project, number, LifecycleState::Active)
    }

    pub fn with_project_state(self, project: &str, number: &str, state: LifecycleState) -> Self {
        self.lock()
            .projects
            .insert(project.to_owned(), (number.to_owned(), state));
        self
    }

    /// Pre-create a secret holding `values` as its versions
    pub fn with_secret(self, project: &str, name: &str, values: &[&str]) -> Self {
        self.lock().secrets.insert(
            (project.to_owned(), name.to_owned()),
            StoredSecret {
                versions: values.iter().map(|v| v.as_bytes().to_vec()).collect(),
                policy: IamPolicy {
                    etag: Some(etag(0)),
                    ..Default::default()
                },
                etag: 0,
            },
        );
        self
    }

    /// Make every call of `operation` fail with `kind`
    pub fn fail_with(&self, operation: Operation, kind: ErrorKind) {
        self.lock().failures.insert(operation, kind);
    }

    /// Have the next create find the secret made by someone else after the lookup
    pub fn race_next_create(&self) {
        self.lock().create_race = true;
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn secret_exists(&self, project: &str, name: &str) -> bool {
        self.lock()
            .secrets
            .contains_key(&(project.to_owned(), name.to_owned()))
    }

    pub fn version_count(&self, project: &str, name: &str) -> usize {
        self.versions(project, name).len()
    }

    /// Payload of a version by its 1-based number, like `versions/1`
    pub fn access_version(&self, project: &str, name: &str, version: usize) -> Option<Vec<u8>> {
        version
            .checked_sub(1)
            .and_then(|index| self.versions(project, name).get(index).cloned())
    }

    pub fn latest(&self, project: &str, name: &str) -> Option<Vec<u8>> {
        self.versions(project, name).last().cloned()
    }

    pub fn policy(&self, project: &str, name: &str) -> Option<IamPolicy> {
        self.lock()
            .secrets
            .get(&(project.to_owned(), name.to_owned()))
            .map(|s| s.policy.clone())
    }

    fn versions(&self, project: &str, name: &str) -> Vec<Vec<u8>> {
        self.lock()
            .secrets
            .get(&(project.to_owned(), name.to_owned()))
            .map(|s| s.versions.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Record the call and return the injected failure for it, if any
    fn enter(&self, operation: Operation) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(operation);

        if let Some(kind) = state.failures.get(&operation).copied() {
            return Err(ApiError::from(kind).into());
        }

        Ok(state)
    }
}

fn not_found(what: &str) -> anyhow::Error {
    ApiError::new(
        ErrorKind::NotFound,
        format!("{what} not found"),
        StatusCode::NOT_FOUND,
    )
    .into()
}

fn secret_response(project: &ProjectId, name: &SecretName) -> SecretResponse {
    SecretResponse {
        name: format!("projects/{project}/secrets/{name}"),
        create_time: None,
        labels: BTreeMap::new(),
        etag: None,
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(
        &self,
        project: &ProjectId,
        name: &SecretName,
    ) -> Result<Option<SecretResponse>> {
        let state = self.enter(Operation::GetSecret)?;

        Ok(state
            .secrets
            .contains_key(&key(project, name))
            .then(|| secret_response(project, name)))
    }

    async fn create_secret(
        &self,
        project: &ProjectId,
        name: &SecretName,
    ) -> Result<SecretResponse> {
        let mut state = self.enter(Operation::CreateSecret)?;

        if std::mem::take(&mut state.create_race) {
            state.secrets.entry(key(project, name)).or_default();
        }

        if state.secrets.contains_key(&key(project, name)) {
            return Err(ApiError::new(
                ErrorKind::AlreadyExists,
                format!("Secret [projects/{project}/secrets/{name}] already exists."),
                StatusCode::CONFLICT,
            )
            .into());
        }

        state.secrets.insert(
            key(project, name),
            StoredSecret {
                policy: IamPolicy {
                    etag: Some(etag(0)),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        Ok(secret_response(project, name))
    }

    async fn add_secret_version(
        &self,
        project: &ProjectId,
        name: &SecretName,
        value: &[u8],
    ) -> Result<SecretVersionResponse> {
        let mut state = self.enter(Operation::AddSecretVersion)?;
        let secret = state
            .secrets
            .get_mut(&key(project, name))
            .ok_or_else(|| not_found("secret"))?;

        secret.versions.push(value.to_vec());

        Ok(SecretVersionResponse {
            name: format!(
                "projects/{project}/secrets/{name}/versions/{}",
                secret.versions.len()
            ),
            create_time: None,
            state: SecretVersionState::Enabled,
        })
    }

    async fn get_iam_policy(&self, project: &ProjectId, name: &SecretName) -> Result<IamPolicy> {
        let state = self.enter(Operation::GetIamPolicy)?;

        state
            .secrets
            .get(&key(project, name))
            .map(|s| s.policy.clone())
            .ok_or_else(|| not_found("secret"))
    }

    async fn set_iam_policy(
        &self,
        project: &ProjectId,
        name: &SecretName,
        mut policy: IamPolicy,
    ) -> Result<IamPolicy> {
        let mut state = self.enter(Operation::SetIamPolicy)?;
        let secret = state
            .secrets
            .get_mut(&key(project, name))
            .ok_or_else(|| not_found("secret"))?;

        if policy.etag != secret.policy.etag {
            return Err(ApiError::from(ErrorKind::Aborted).into());
        }

        secret.etag += 1;
        policy.etag = Some(etag(secret.etag));
        secret.policy = policy.clone();

        Ok(policy)
    }
}

#[async_trait]
impl ProjectLookup for MemorySecretStore {
    async fn get_project(&self, project: &ProjectId) -> Result<ProjectResponse> {
        let state = self.enter(Operation::GetProject)?;
        let (number, lifecycle_state) = state
            .projects
            .get(project.as_str())
            .ok_or_else(|| not_found("project"))?;

        Ok(ProjectResponse {
            project_id: project.to_string(),
            project_number: number.clone(),
            name: None,
            lifecycle_state: lifecycle_state.clone(),
        })
    }
}
