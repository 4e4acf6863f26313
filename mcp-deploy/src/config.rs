//! Typed views of everything a deployment is configured by.
//!
//! [`ServiceNowConfig`] is read from the env file and [`DeploymentConfig`] combines it with the
//! command line. Both are built once and passed down; nothing here is global.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mcp_deploy_common::{
    constants::{env_keys, DEFAULT_CONTAINER_PORT, DEFAULT_TOOL_PACKAGE},
    models::{ProjectId, SecretRef},
    EnvFile, Secret,
};
use strum::{Display, EnumString};
use url::Url;

use crate::args::DeployArgs;
use crate::error::EnvironmentError;

/// How the MCP server authenticates against ServiceNow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AuthType {
    #[default]
    Basic,
    Oauth,
    ApiKey,
}

#[derive(Clone, Debug)]
pub struct ServiceNowConfig {
    pub instance_url: Url,
    pub username: String,
    pub password: Secret<String>,
    pub auth_type: AuthType,
    pub tool_package: String,
}

impl ServiceNowConfig {
    const REQUIRED_KEYS: [&'static str; 3] = [
        env_keys::INSTANCE_URL,
        env_keys::USERNAME,
        env_keys::PASSWORD,
    ];

    /// Build the config from a parsed env file. `path` is only used in error messages.
    pub fn from_env_file(env: &EnvFile, path: &Path) -> Result<Self, EnvironmentError> {
        // a key set to an empty value is as good as missing
        let missing: Vec<_> = Self::REQUIRED_KEYS
            .into_iter()
            .filter(|key| env.get(key).map_or(true, str::is_empty))
            .collect();
        if !missing.is_empty() {
            return Err(EnvironmentError::MissingKeys {
                path: path.to_path_buf(),
                keys: missing,
            });
        }

        let (Some(raw_url), Some(username), Some(password)) = (
            env.get(env_keys::INSTANCE_URL),
            env.get(env_keys::USERNAME),
            env.get_secret(env_keys::PASSWORD),
        ) else {
            return Err(EnvironmentError::MissingKeys {
                path: path.to_path_buf(),
                keys: Self::REQUIRED_KEYS.to_vec(),
            });
        };

        let instance_url = Url::parse(raw_url).map_err(|e| EnvironmentError::InvalidValue {
            key: env_keys::INSTANCE_URL,
            reason: e.to_string(),
        })?;
        if !matches!(instance_url.scheme(), "http" | "https") {
            return Err(EnvironmentError::InvalidValue {
                key: env_keys::INSTANCE_URL,
                reason: format!("expected an http(s) url, got scheme '{}'", instance_url.scheme()),
            });
        }

        let auth_type = match env.get(env_keys::AUTH_TYPE) {
            None | Some("") => AuthType::default(),
            Some(raw) => raw.parse().map_err(|_| EnvironmentError::InvalidValue {
                key: env_keys::AUTH_TYPE,
                reason: format!("'{raw}' is not one of basic, oauth, api_key"),
            })?,
        };

        let tool_package = match env.get(env_keys::TOOL_PACKAGE) {
            None | Some("") => DEFAULT_TOOL_PACKAGE.to_owned(),
            Some(package) => package.to_owned(),
        };

        Ok(Self {
            instance_url,
            username: username.to_owned(),
            password,
            auth_type,
            tool_package,
        })
    }

    /// Settings that are safe to pass as plain environment variables
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                env_keys::INSTANCE_URL.to_owned(),
                self.instance_url.as_str().trim_end_matches('/').to_owned(),
            ),
            (env_keys::USERNAME.to_owned(), self.username.clone()),
            (env_keys::AUTH_TYPE.to_owned(), self.auth_type.to_string()),
            (env_keys::TOOL_PACKAGE.to_owned(), self.tool_package.clone()),
        ])
    }
}

/// Everything `gcloud run deploy` needs
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentConfig {
    pub project: ProjectId,
    pub region: String,
    pub service_name: String,
    pub source: PathBuf,
    pub env_vars: BTreeMap<String, String>,
    /// Env var name to the secret version it is filled from
    pub secrets: BTreeMap<String, SecretRef>,
    pub allow_unauthenticated: bool,
    pub port: u16,
}

impl DeploymentConfig {
    pub fn new(
        args: &DeployArgs,
        project: ProjectId,
        servicenow: &ServiceNowConfig,
        password: SecretRef,
    ) -> Self {
        Self {
            project,
            region: args.region.clone(),
            service_name: args.service_name.clone(),
            source: args.source.clone(),
            env_vars: servicenow.env_vars(),
            secrets: BTreeMap::from([(env_keys::PASSWORD.to_owned(), password)]),
            allow_unauthenticated: !args.no_allow_unauthenticated,
            port: DEFAULT_CONTAINER_PORT,
        }
    }
}
