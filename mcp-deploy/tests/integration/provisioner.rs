use mcp_deploy::provisioner::{GrantOutcome, SecretProvisioner};
use mcp_deploy_api_client::util::api_error_kind;
use mcp_deploy_common::{
    constants::SECRET_ACCESSOR_ROLE,
    models::{ErrorKind, Principal, ProjectId, SecretName},
    Secret,
};
use mcp_deploy_common_tests::{MemorySecretStore, Operation, PROJECT, PROJECT_NUMBER, SECRET};
use pretty_assertions::assert_eq;

const COMPUTE_SA: &str = "serviceAccount:123456789012-compute@developer.gserviceaccount.com";

fn ids() -> (ProjectId, SecretName) {
    (PROJECT.parse().unwrap(), SECRET.parse().unwrap())
}

fn password(value: &str) -> Secret<String> {
    Secret::new(value.to_owned())
}

#[tokio::test]
async fn new_secret_gets_exactly_one_version() {
    let store = MemorySecretStore::new();
    let (project, name) = ids();

    let secret_ref = SecretProvisioner::new(&store)
        .ensure_secret(&project, &name, &password("secret123"))
        .await
        .unwrap();

    assert_eq!(secret_ref.to_string(), "servicenow-password:latest");
    assert!(store.secret_exists(PROJECT, SECRET));
    assert_eq!(store.version_count(PROJECT, SECRET), 1);
    assert_eq!(store.latest(PROJECT, SECRET).unwrap(), b"secret123");
}

#[tokio::test]
async fn existing_secret_gets_one_more_version() {
    let store = MemorySecretStore::new().with_secret(PROJECT, SECRET, &["old", "older"]);
    let (project, name) = ids();

    SecretProvisioner::new(&store)
        .ensure_secret(&project, &name, &password("secret123"))
        .await
        .unwrap();

    assert_eq!(store.version_count(PROJECT, SECRET), 3);
    assert_eq!(store.access_version(PROJECT, SECRET, 1).unwrap(), b"old");
    assert_eq!(store.access_version(PROJECT, SECRET, 2).unwrap(), b"older");
    assert_eq!(store.latest(PROJECT, SECRET).unwrap(), b"secret123");
    assert!(!store.calls().contains(&Operation::CreateSecret));
}

#[tokio::test]
async fn create_race_falls_back_to_adding_a_version() {
    let store = MemorySecretStore::new();
    store.race_next_create();
    let (project, name) = ids();

    SecretProvisioner::new(&store)
        .ensure_secret(&project, &name, &password("secret123"))
        .await
        .unwrap();

    assert_eq!(
        store.calls(),
        vec![
            Operation::GetSecret,
            Operation::CreateSecret,
            Operation::AddSecretVersion
        ]
    );
    assert_eq!(store.latest(PROJECT, SECRET).unwrap(), b"secret123");
}

#[tokio::test]
async fn empty_value_is_rejected_locally() {
    let store = MemorySecretStore::new();
    let (project, name) = ids();

    let err = SecretProvisioner::new(&store)
        .ensure_secret(&project, &name, &password(""))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("empty value"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn store_errors_keep_their_kind() {
    let store = MemorySecretStore::new();
    store.fail_with(Operation::GetSecret, ErrorKind::PermissionDenied);
    let (project, name) = ids();

    let err = SecretProvisioner::new(&store)
        .ensure_secret(&project, &name, &password("secret123"))
        .await
        .unwrap_err();

    assert_eq!(api_error_kind(&err), Some(ErrorKind::PermissionDenied));
    assert!(!store.secret_exists(PROJECT, SECRET));
}

#[tokio::test]
async fn failed_create_is_not_retried() {
    let store = MemorySecretStore::new();
    store.fail_with(Operation::CreateSecret, ErrorKind::Unavailable);
    let (project, name) = ids();

    let err = SecretProvisioner::new(&store)
        .ensure_secret(&project, &name, &password("secret123"))
        .await
        .unwrap_err();

    assert_eq!(api_error_kind(&err), Some(ErrorKind::Unavailable));
    assert_eq!(
        store.calls(),
        vec![Operation::GetSecret, Operation::CreateSecret]
    );
}

#[tokio::test]
async fn grant_is_idempotent() {
    let store = MemorySecretStore::new().with_secret(PROJECT, SECRET, &["secret123"]);
    let (project, name) = ids();
    let provisioner = SecretProvisioner::new(&store);

    let first = provisioner
        .grant_access(&project, &name, COMPUTE_SA, SECRET_ACCESSOR_ROLE)
        .await
        .unwrap();
    let after_first = store.policy(PROJECT, SECRET).unwrap().bindings;
    let second = provisioner
        .grant_access(&project, &name, COMPUTE_SA, SECRET_ACCESSOR_ROLE)
        .await
        .unwrap();

    assert_eq!(first, GrantOutcome::Granted);
    assert_eq!(second, GrantOutcome::AlreadyGranted);
    assert_eq!(store.policy(PROJECT, SECRET).unwrap().bindings, after_first);

    let principal: Principal = COMPUTE_SA.parse().unwrap();
    assert!(store
        .policy(PROJECT, SECRET)
        .unwrap()
        .has_member(SECRET_ACCESSOR_ROLE, &principal));
    assert_eq!(
        store
            .calls()
            .iter()
            .filter(|op| **op == Operation::SetIamPolicy)
            .count(),
        1
    );
}

#[tokio::test]
async fn grant_keeps_other_bindings() {
    let store = MemorySecretStore::new().with_secret(PROJECT, SECRET, &["secret123"]);
    let (project, name) = ids();
    let provisioner = SecretProvisioner::new(&store);

    provisioner
        .grant_access(&project, &name, "user:ops@example.com", "roles/secretmanager.admin")
        .await
        .unwrap();
    provisioner
        .grant_access(&project, &name, COMPUTE_SA, SECRET_ACCESSOR_ROLE)
        .await
        .unwrap();

    let policy = store.policy(PROJECT, SECRET).unwrap();
    assert_eq!(policy.bindings.len(), 2);
    assert!(policy.has_member(
        "roles/secretmanager.admin",
        &"user:ops@example.com".parse().unwrap()
    ));
}

#[tokio::test]
async fn malformed_principal_is_rejected_locally() {
    let store = MemorySecretStore::new().with_secret(PROJECT, SECRET, &["secret123"]);
    let (project, name) = ids();

    let err = SecretProvisioner::new(&store)
        .grant_access(&project, &name, "robot@example.com", SECRET_ACCESSOR_ROLE)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("malformed principal"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn compute_principal_comes_from_project_number() {
    use mcp_deploy_api_client::ProjectLookup;

    let store = MemorySecretStore::new().with_project(PROJECT, PROJECT_NUMBER);

    let project = store.get_project(&PROJECT.parse().unwrap()).await.unwrap();

    assert_eq!(project.compute_principal().as_str(), COMPUTE_SA);
}
