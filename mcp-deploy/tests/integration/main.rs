mod deploy;
mod provisioner;

use std::path::{Path, PathBuf};

use mcp_deploy::DeployArgs;
use mcp_deploy_common_tests::{PROJECT, SECRET};
use tempfile::TempDir;

/// Write `contents` as `.env` in a fresh directory, which doubles as the source directory
fn env_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(&path, contents).unwrap();

    (dir, path)
}

/// Non-interactive arguments for a deployment into the test project
fn deploy_args(env_file: &Path) -> DeployArgs {
    DeployArgs {
        project: Some(PROJECT.parse().unwrap()),
        region: "us-central1".to_owned(),
        service_name: "servicenow-mcp".to_owned(),
        env_file: env_file.to_path_buf(),
        source: env_file.parent().unwrap().to_path_buf(),
        secret_name: SECRET.parse().unwrap(),
        yes: true,
        skip_enable_apis: false,
        no_allow_unauthenticated: false,
        gcloud: "gcloud".to_owned(),
        debug: false,
    }
}
