use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

use crate::constants::compute_service_account;

use super::iam::Principal;

// Note: the string "Invalid project id" is matched on by tests. Changing it is breaking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Invalid project id '{0}'. Project ids must:
    1. be 6 to 30 characters long.
    2. only contain lowercase letters, digits or dashes `-`.
    3. start with a letter.
    4. not end with a dash."
)]
pub struct InvalidProjectId(pub String);

/// A Google Cloud project id, optionally prefixed by the domain of a legacy domain-scoped project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(id: &str) -> bool {
        let name = match id.rsplit_once(':') {
            Some((domain, name)) if !domain.is_empty() => name,
            Some(_) => return false,
            None => id,
        };

        (6..=30).contains(&name.len())
            && name.starts_with(|c: char| c.is_ascii_lowercase())
            && !name.ends_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl FromStr for ProjectId {
    type Err = InvalidProjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if Self::is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidProjectId(s.to_owned()))
        }
    }
}

impl TryFrom<String> for ProjectId {
    type Error = InvalidProjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, StrumDisplay, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    #[default]
    LifecycleStateUnspecified,
    Active,
    DeleteRequested,
    DeleteInProgress,
}

/// Project resource as returned by the Resource Manager v1 API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub project_id: String,
    pub project_number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: LifecycleState,
}

impl ProjectResponse {
    pub fn is_active(&self) -> bool {
        self.lifecycle_state == LifecycleState::Active
    }

    /// The identity Cloud Run revisions run as when no service account is configured
    pub fn compute_principal(&self) -> Principal {
        Principal::service_account(&compute_service_account(&self.project_number))
    }
}
