pub mod error;
pub mod iam;
pub mod project;
pub mod secret;

pub use error::{ApiError, ErrorKind};
pub use iam::{IamPolicy, Principal};
pub use project::{ProjectId, ProjectResponse};
pub use secret::{SecretName, SecretRef};
