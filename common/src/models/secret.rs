use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

use crate::constants::{LATEST_VERSION, MANAGED_BY_LABEL};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Invalid secret name '{0}'. Secret names must be 1 to 255 characters of letters, digits, \
    dashes `-` or underscores `_`"
)]
pub struct InvalidSecretName(pub String);

/// Name of a secret within a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretName(String);

impl SecretName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SecretName {
    type Err = InvalidSecretName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = (1..=255).contains(&s.len())
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidSecretName(s.to_owned()))
        }
    }
}

impl TryFrom<String> for SecretName {
    type Error = InvalidSecretName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SecretName> for String {
    fn from(name: SecretName) -> Self {
        name.0
    }
}

impl Display for SecretName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a secret version that a deployment resolves at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub name: SecretName,
    pub version: String,
}

impl SecretRef {
    pub fn latest(name: SecretName) -> Self {
        Self {
            name,
            version: LATEST_VERSION.to_owned(),
        }
    }
}

/// Renders as `name:version`, the form `gcloud run deploy --set-secrets` expects
impl Display for SecretRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// Secret resource as returned by the Secret Manager v1 API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
    /// `projects/{project}/secrets/{secret}`
    pub name: String,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretRequest {
    pub replication: Replication,
    pub labels: BTreeMap<String, String>,
}

impl Default for CreateSecretRequest {
    fn default() -> Self {
        Self {
            replication: Replication::default(),
            labels: BTreeMap::from([(
                MANAGED_BY_LABEL.0.to_owned(),
                MANAGED_BY_LABEL.1.to_owned(),
            )]),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Replication {
    pub automatic: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, StrumDisplay, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecretVersionState {
    #[default]
    StateUnspecified,
    Enabled,
    Disabled,
    Destroyed,
}

/// Secret version resource as returned by the Secret Manager v1 API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVersionResponse {
    /// `projects/{project}/secrets/{secret}/versions/{version}`
    pub name: String,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub state: SecretVersionState,
}

impl SecretVersionResponse {
    /// The trailing version id of the resource name
    pub fn version_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// Body of an `addVersion` call. The payload is base64 encoded on the wire.
#[derive(Clone, Serialize)]
pub struct AddSecretVersionRequest {
    pub payload: SecretPayload,
}

#[derive(Clone, Serialize)]
pub struct SecretPayload {
    pub data: String,
}

impl AddSecretVersionRequest {
    pub fn new(value: &[u8]) -> Self {
        Self {
            payload: SecretPayload {
                data: STANDARD.encode(value),
            },
        }
    }
}

impl std::fmt::Debug for AddSecretVersionRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddSecretVersionRequest")
            .field("payload", &"[REDACTED]")
            .finish()
    }
}
