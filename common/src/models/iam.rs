use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Invalid principal '{0}'. Principals look like `serviceAccount:name@project.iam.gserviceaccount.com`, \
    `user:someone@example.com`, `group:team@example.com` or `domain:example.com`"
)]
pub struct InvalidPrincipal(pub String);

const PRINCIPAL_TYPES: [&str; 4] = ["user", "serviceAccount", "group", "domain"];

/// An IAM member identifier in `type:identifier` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    pub fn service_account(email: &str) -> Self {
        Self(format!("serviceAccount:{email}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Principal {
    type Err = InvalidPrincipal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = match s.split_once(':') {
            Some((kind, id)) => {
                PRINCIPAL_TYPES.contains(&kind)
                    && !id.is_empty()
                    && !id.chars().any(char::is_whitespace)
                    && (kind == "domain" || id.contains('@'))
            }
            None => false,
        };

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidPrincipal(s.to_owned()))
        }
    }
}

impl TryFrom<String> for Principal {
    type Error = InvalidPrincipal;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// IAM policy attached to a resource, in its REST representation
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
    /// Must be sent back unchanged on update so concurrent edits are rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
}

impl IamPolicy {
    /// Whether `member` holds `role` through an unconditional binding
    pub fn has_member(&self, role: &str, member: &Principal) -> bool {
        self.bindings.iter().any(|binding| {
            binding.role == role
                && binding.condition.is_none()
                && binding.members.iter().any(|m| m == member.as_str())
        })
    }

    /// Add `member` to the unconditional binding for `role`.
    ///
    /// Returns `false` when the member was already bound and the policy is unchanged.
    pub fn add_member(&mut self, role: &str, member: &Principal) -> bool {
        if self.has_member(role, member) {
            return false;
        }

        match self
            .bindings
            .iter_mut()
            .find(|binding| binding.role == role && binding.condition.is_none())
        {
            Some(binding) => binding.members.push(member.to_string()),
            None => self.bindings.push(Binding {
                role: role.to_owned(),
                members: vec![member.to_string()],
                condition: None,
            }),
        }

        true
    }
}

/// Body of a `setIamPolicy` call
#[derive(Debug, Clone, Serialize)]
pub struct SetIamPolicyRequest {
    pub policy: IamPolicy,
}
