pub mod prompter;
pub mod sdk;
pub mod secret_manager;
pub mod store;

pub use prompter::ScriptedPrompter;
pub use sdk::RecordingSdk;
pub use store::{MemorySecretStore, Operation};

pub const PROJECT: &str = "my-project";
pub const PROJECT_NUMBER: &str = "123456789012";
pub const SECRET: &str = "servicenow-password";

/// Env file contents with every required key set
pub const ENV_FILE: &str = r#"# ServiceNow connection
SERVICENOW_INSTANCE_URL="https://x.example.com"
SERVICENOW_USERNAME="admin"
SERVICENOW_PASSWORD="secret123"
"#;
