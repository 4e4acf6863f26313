//! Shared constants used across mcp-deploy crates

// Deployment defaults
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_SERVICE_NAME: &str = "servicenow-mcp";
pub const DEFAULT_SECRET_NAME: &str = "servicenow-password";
pub const DEFAULT_ENV_FILE: &str = ".env";
/// Port the MCP SSE server listens on inside the container
pub const DEFAULT_CONTAINER_PORT: u16 = 8080;

/// Version alias used when a deployment references a secret
pub const LATEST_VERSION: &str = "latest";

/// Role that allows reading secret payloads
pub const SECRET_ACCESSOR_ROLE: &str = "roles/secretmanager.secretAccessor";

/// Label put on every secret this tool creates
pub const MANAGED_BY_LABEL: (&str, &str) = ("managed-by", "mcp-deploy");

/// APIs the deployment depends on
pub const REQUIRED_SERVICES: [&str; 4] = [
    "run.googleapis.com",
    "cloudbuild.googleapis.com",
    "secretmanager.googleapis.com",
    "artifactregistry.googleapis.com",
];

// Endpoints
pub const SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com";
pub const RESOURCE_MANAGER_URL: &str = "https://cloudresourcemanager.googleapis.com";

/// Paths served by the deployed MCP server
pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages/";

/// Keys read from the env file
pub mod env_keys {
    pub const INSTANCE_URL: &str = "SERVICENOW_INSTANCE_URL";
    pub const USERNAME: &str = "SERVICENOW_USERNAME";
    pub const PASSWORD: &str = "SERVICENOW_PASSWORD";
    pub const AUTH_TYPE: &str = "SERVICENOW_AUTH_TYPE";
    pub const TOOL_PACKAGE: &str = "MCP_TOOL_PACKAGE";
}

pub const DEFAULT_TOOL_PACKAGE: &str = "full";

/// The default compute service account Cloud Run revisions run as
pub fn compute_service_account(project_number: &str) -> String {
    format!("{project_number}-compute@developer.gserviceaccount.com")
}
