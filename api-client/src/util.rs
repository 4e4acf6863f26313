use anyhow::{Context, Result};
use async_trait::async_trait;
use http::StatusCode;
use mcp_deploy_common::models::{ApiError, ErrorKind};
use serde::de::DeserializeOwned;

/// Helpers for consuming and parsing response bodies and handling parsing of an [`ApiError`] if
/// the response is 4xx/5xx
#[async_trait]
pub trait ToBodyContent {
    async fn to_json<T: DeserializeOwned>(self) -> Result<T>;
}

fn into_api_error(body: &str, status_code: StatusCode) -> ApiError {
    #[cfg(feature = "tracing")]
    tracing::trace!("Parsing response as API error");

    ApiError::from_response(body, status_code)
}

/// Tries to convert bytes to string. If not possible, returns a string symbolizing the bytes and the length
fn bytes_to_string_with_fallback(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| format!("[{} bytes]", bytes.len()))
}

#[async_trait]
impl ToBodyContent for reqwest::Response {
    async fn to_json<T: DeserializeOwned>(self) -> Result<T> {
        let status_code = self.status();
        let bytes = self.bytes().await?;
        let string = bytes_to_string_with_fallback(&bytes);

        if status_code.is_client_error() || status_code.is_server_error() {
            return Err(into_api_error(&string, status_code).into());
        }

        // Response bodies never carry secret payloads for the calls made by this client
        #[cfg(feature = "tracing")]
        tracing::trace!(response = %string, "Parsing response as JSON");

        serde_json::from_str(&string).context("failed to parse a successful response")
    }
}

/// Find the [`ApiError`] kind anywhere in an error chain
pub fn api_error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .map(ApiError::kind)
}
