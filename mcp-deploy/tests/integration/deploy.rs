use std::sync::Arc;

use mcp_deploy::{error::EnvironmentError, CommandOutcome, McpDeploy};
use mcp_deploy_api_client::{util::api_error_kind, ApiEndpoints, GcpApiClient};
use mcp_deploy_common::{
    constants::{REQUIRED_SERVICES, SECRET_ACCESSOR_ROLE},
    models::{project::LifecycleState, ErrorKind},
    Secret,
};
use mcp_deploy_common_tests::{
    secret_manager::mocked_secret_manager, MemorySecretStore, Operation, RecordingSdk,
    ScriptedPrompter, ENV_FILE, PROJECT, PROJECT_NUMBER, SECRET,
};
use pretty_assertions::assert_eq;

use crate::{deploy_args, env_file};

struct Harness {
    sdk: Arc<RecordingSdk>,
    prompter: Arc<ScriptedPrompter>,
    store: Arc<MemorySecretStore>,
}

impl Harness {
    fn new(store: MemorySecretStore) -> Self {
        Self::with(RecordingSdk::new(), true, store)
    }

    fn with(sdk: RecordingSdk, answer: bool, store: MemorySecretStore) -> Self {
        Self {
            sdk: Arc::new(sdk),
            prompter: Arc::new(ScriptedPrompter::answering(answer)),
            store: Arc::new(store.with_project(PROJECT, PROJECT_NUMBER)),
        }
    }

    fn deployer(&self) -> McpDeploy {
        McpDeploy::with_parts(
            self.sdk.clone(),
            self.prompter.clone(),
            self.store.clone(),
        )
    }
}

#[tokio::test]
async fn first_deployment_creates_the_secret() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new());

    let outcome = harness.deployer().run(deploy_args(&path)).await.unwrap();

    let CommandOutcome::Deployed(endpoints) = outcome else {
        panic!("expected a deployment");
    };
    assert_eq!(endpoints.url, "https://servicenow-mcp-abc123-uc.a.run.app");
    assert_eq!(endpoints.sse, "https://servicenow-mcp-abc123-uc.a.run.app/sse");
    assert_eq!(
        endpoints.messages,
        "https://servicenow-mcp-abc123-uc.a.run.app/messages/"
    );

    assert_eq!(harness.store.version_count(PROJECT, SECRET), 1);
    assert_eq!(
        harness.store.access_version(PROJECT, SECRET, 1).unwrap(),
        b"secret123"
    );
    assert_eq!(harness.sdk.enabled_services(), REQUIRED_SERVICES.to_vec());
}

#[tokio::test]
async fn redeployment_adds_a_version() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new().with_secret(PROJECT, SECRET, &["old"]));

    harness.deployer().run(deploy_args(&path)).await.unwrap();

    assert_eq!(harness.store.version_count(PROJECT, SECRET), 2);
    assert_eq!(harness.store.access_version(PROJECT, SECRET, 1).unwrap(), b"old");
    assert_eq!(harness.store.latest(PROJECT, SECRET).unwrap(), b"secret123");
}

#[tokio::test]
async fn password_is_passed_by_reference_only() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new());

    harness.deployer().run(deploy_args(&path)).await.unwrap();

    let deployments = harness.sdk.deployments();
    assert_eq!(deployments.len(), 1);
    let config = &deployments[0];
    assert_eq!(
        config.secrets["SERVICENOW_PASSWORD"].to_string(),
        "servicenow-password:latest"
    );
    assert!(!config.env_vars.contains_key("SERVICENOW_PASSWORD"));
    assert!(config.env_vars.values().all(|v| !v.contains("secret123")));
    assert_eq!(config.env_vars["SERVICENOW_INSTANCE_URL"], "https://x.example.com");
    assert_eq!(config.env_vars["MCP_TOOL_PACKAGE"], "full");
    assert!(config.allow_unauthenticated);
}

#[tokio::test]
async fn compute_account_can_read_the_secret() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new());

    harness.deployer().run(deploy_args(&path)).await.unwrap();
    harness.deployer().run(deploy_args(&path)).await.unwrap();

    let policy = harness.store.policy(PROJECT, SECRET).unwrap();
    assert_eq!(policy.bindings.len(), 1);
    assert_eq!(policy.bindings[0].role, SECRET_ACCESSOR_ROLE);
    assert_eq!(
        policy.bindings[0].members,
        vec!["serviceAccount:123456789012-compute@developer.gserviceaccount.com"]
    );
    let policy_writes = harness
        .store
        .calls()
        .into_iter()
        .filter(|op| *op == Operation::SetIamPolicy)
        .count();
    assert_eq!(policy_writes, 1);
}

#[tokio::test]
async fn declining_skips_the_deployment() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::with(RecordingSdk::new(), false, MemorySecretStore::new());
    let mut args = deploy_args(&path);
    args.yes = false;

    let outcome = harness.deployer().run(args).await.unwrap();

    assert_eq!(outcome, CommandOutcome::Cancelled);
    assert!(harness.sdk.deployments().is_empty());
    assert_eq!(
        harness.prompter.prompts(),
        vec!["Deploy service 'servicenow-mcp' to us-central1 in project my-project?"]
    );
}

#[tokio::test]
async fn yes_skips_the_prompt() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::with(RecordingSdk::new(), false, MemorySecretStore::new());

    harness.deployer().run(deploy_args(&path)).await.unwrap();

    assert!(harness.prompter.prompts().is_empty());
    assert_eq!(harness.sdk.deployments().len(), 1);
}

#[tokio::test]
async fn permission_denied_stops_the_deployment() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new());
    harness
        .store
        .fail_with(Operation::GetSecret, ErrorKind::PermissionDenied);

    let err = harness.deployer().run(deploy_args(&path)).await.unwrap_err();

    assert_eq!(api_error_kind(&err), Some(ErrorKind::PermissionDenied));
    assert!(err
        .to_string()
        .starts_with("failed to provision secret 'servicenow-password'"));
    assert!(harness.sdk.deployments().is_empty());
}

#[tokio::test]
async fn inactive_project_stops_before_provisioning() {
    let (_dir, path) = env_file(ENV_FILE);
    let sdk = Arc::new(RecordingSdk::new());
    let store = Arc::new(MemorySecretStore::new().with_project_state(
        PROJECT,
        PROJECT_NUMBER,
        LifecycleState::DeleteRequested,
    ));

    let err = McpDeploy::with_parts(
        sdk.clone(),
        Arc::new(ScriptedPrompter::answering(true)),
        store.clone(),
    )
    .run(deploy_args(&path))
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EnvironmentError>(),
        Some(EnvironmentError::InactiveProject { .. })
    ));
    assert_eq!(
        err.to_string(),
        "Project my-project is DELETE_REQUESTED. Only ACTIVE projects can be deployed to"
    );
    assert_eq!(store.calls(), vec![Operation::GetProject]);
    assert!(!store.secret_exists(PROJECT, SECRET));
    assert!(sdk.deployments().is_empty());
}

#[tokio::test]
async fn missing_gcloud_is_reported_first() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::with(RecordingSdk::new().not_installed(), true, MemorySecretStore::new());

    let err = harness.deployer().run(deploy_args(&path)).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EnvironmentError>(),
        Some(EnvironmentError::MissingTool("gcloud"))
    ));
    assert!(harness.store.calls().is_empty());
}

#[tokio::test]
async fn active_gcloud_project_is_used_without_flag() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::with(
        RecordingSdk::new().with_active_project(PROJECT),
        true,
        MemorySecretStore::new(),
    );
    let mut args = deploy_args(&path);
    args.project = None;

    harness.deployer().run(args).await.unwrap();

    assert_eq!(harness.sdk.deployments()[0].project.as_str(), PROJECT);
}

#[tokio::test]
async fn unresolved_project_is_fatal() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new());
    let mut args = deploy_args(&path);
    args.project = None;

    let err = harness.deployer().run(args).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EnvironmentError>(),
        Some(EnvironmentError::UnresolvedProject)
    ));
}

#[tokio::test]
async fn missing_keys_stop_before_any_remote_call() {
    let (_dir, path) = env_file("SERVICENOW_INSTANCE_URL=https://x.example.com\n");
    let harness = Harness::new(MemorySecretStore::new());

    let err = harness.deployer().run(deploy_args(&path)).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "Missing required keys in {}: SERVICENOW_USERNAME, SERVICENOW_PASSWORD",
            path.display()
        )
    );
    assert!(harness.store.calls().is_empty());
    assert!(harness.sdk.enabled_services().is_empty());
}

#[tokio::test]
async fn missing_env_file_is_fatal() {
    let (dir, _path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new());

    let err = harness
        .deployer()
        .run(deploy_args(&dir.path().join("missing.env")))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EnvironmentError>(),
        Some(EnvironmentError::MissingConfigFile(_))
    ));
}

#[tokio::test]
async fn api_enablement_can_be_skipped() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::new(MemorySecretStore::new());
    let mut args = deploy_args(&path);
    args.skip_enable_apis = true;

    harness.deployer().run(args).await.unwrap();

    assert!(harness.sdk.enabled_services().is_empty());
}

#[tokio::test]
async fn failed_deploy_surfaces() {
    let (_dir, path) = env_file(ENV_FILE);
    let harness = Harness::with(
        RecordingSdk::new().failing_deploy(),
        true,
        MemorySecretStore::new(),
    );

    let err = harness.deployer().run(deploy_args(&path)).await.unwrap_err();

    assert_eq!(err.to_string(), "deployment failed");
    // the secret stays provisioned
    assert_eq!(harness.store.version_count(PROJECT, SECRET), 1);
}

#[tokio::test]
async fn deploys_through_the_rest_api() {
    let (_dir, path) = env_file(ENV_FILE);
    let server = mocked_secret_manager(PROJECT, SECRET, PROJECT_NUMBER).await;
    let client = GcpApiClient::new(
        Secret::new("test-token".to_owned()),
        ApiEndpoints::single(server.uri()),
        Some(5),
    )
    .unwrap();
    let sdk = Arc::new(RecordingSdk::new());

    let outcome = McpDeploy::with_parts(
        sdk.clone(),
        Arc::new(ScriptedPrompter::answering(true)),
        Arc::new(client),
    )
    .run(deploy_args(&path))
    .await
    .unwrap();

    assert!(matches!(outcome, CommandOutcome::Deployed(_)));
    assert_eq!(sdk.deployments().len(), 1);
}
