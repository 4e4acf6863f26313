use std::fmt::{Display, Formatter};
use std::str::FromStr;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};
use tracing::trace;

/// Canonical error codes returned by Google Cloud APIs in the `error.status` field
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
    Aborted,
    ResourceExhausted,
    Unavailable,
    DeadlineExceeded,
    Internal,
    Unknown,
}

impl ErrorKind {
    /// Best guess for responses that did not carry a `status` string
    pub fn from_status_code(code: StatusCode) -> Self {
        match code {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::AlreadyExists,
            StatusCode::FORBIDDEN => Self::PermissionDenied,
            StatusCode::UNAUTHORIZED => Self::Unauthenticated,
            StatusCode::BAD_REQUEST => Self::InvalidArgument,
            StatusCode::PRECONDITION_FAILED => Self::FailedPrecondition,
            StatusCode::TOO_MANY_REQUESTS => Self::ResourceExhausted,
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => Self::Unavailable,
            StatusCode::GATEWAY_TIMEOUT => Self::DeadlineExceeded,
            StatusCode::INTERNAL_SERVER_ERROR => Self::Internal,
            _ => Self::Unknown,
        }
    }

    /// Short operator-facing hint for the kinds a deployment commonly hits
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied => Some(
                "the active gcloud account lacks a required role on this project or secret",
            ),
            Self::Unauthenticated => {
                Some("the access token was rejected. Try `gcloud auth login` and run again")
            }
            Self::Unavailable => Some("the Google Cloud API is currently unreachable"),
            Self::NotFound => Some("check that the project id is correct and the API is enabled"),
            _ => None,
        }
    }
}

/// An error returned by a Google Cloud REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: u16,
}

/// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: status_code.as_u16(),
        }
    }

    /// Decode an error response body, falling back to the HTTP status when the body is not the
    /// standard error envelope
    pub fn from_response(body: &str, status_code: StatusCode) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error }) => {
                let status_code = error
                    .code
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .unwrap_or(status_code);
                let kind = error
                    .status
                    .as_deref()
                    .and_then(|status| ErrorKind::from_str(status).ok())
                    .unwrap_or_else(|| ErrorKind::from_status_code(status_code));

                Self::new(
                    kind,
                    error.message.unwrap_or_else(|| kind.to_string()),
                    status_code,
                )
            }
            Err(_) => {
                trace!("getting error from status code");
                status_code.into()
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.status(), self.message)?;
        if let Some(hint) = self.kind.hint() {
            write!(f, "\nHint: {hint}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl From<ErrorKind> for ApiError {
    fn from(kind: ErrorKind) -> Self {
        let (status, message) = match kind {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "resource not found"),
            ErrorKind::AlreadyExists => (StatusCode::CONFLICT, "resource already exists"),
            ErrorKind::PermissionDenied => (StatusCode::FORBIDDEN, "permission denied"),
            ErrorKind::Unauthenticated => (StatusCode::UNAUTHORIZED, "request is unauthenticated"),
            ErrorKind::InvalidArgument => (StatusCode::BAD_REQUEST, "invalid argument"),
            ErrorKind::FailedPrecondition => (StatusCode::BAD_REQUEST, "failed precondition"),
            ErrorKind::Aborted => (
                StatusCode::CONFLICT,
                "concurrent modification, the resource changed while it was being updated",
            ),
            ErrorKind::ResourceExhausted => (StatusCode::TOO_MANY_REQUESTS, "quota exceeded"),
            ErrorKind::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "service unavailable"),
            ErrorKind::DeadlineExceeded => (StatusCode::GATEWAY_TIMEOUT, "deadline exceeded"),
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
            ErrorKind::Unknown => (StatusCode::INTERNAL_SERVER_ERROR, "unknown error"),
        };

        Self::new(kind, message, status)
    }
}

// Used as a fallback when an API response did not contain the standard error envelope
impl From<StatusCode> for ApiError {
    fn from(code: StatusCode) -> Self {
        let message = match code {
            StatusCode::FORBIDDEN => "this request is not allowed",
            StatusCode::UNAUTHORIZED => "the access token was not accepted",
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                "the API is not reachable right now"
            }
            StatusCode::NOT_FOUND => "the requested resource does not exist",
            _ => "an unexpected error occurred",
        };

        Self::new(ErrorKind::from_status_code(code), message, code)
    }
}
