use std::time::Duration;

use anyhow::{Context, Result};
use mcp_deploy_common::constants::{RESOURCE_MANAGER_URL, SECRET_MANAGER_URL};
use mcp_deploy_common::Secret;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Response;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};

#[cfg(feature = "tracing")]
mod middleware;
#[cfg(feature = "tracing")]
use crate::middleware::LoggingMiddleware;

mod resource_manager;
mod secret_manager;
pub mod store;
pub mod util;

pub use store::{CloudApi, ProjectLookup, SecretStore};
use util::ToBodyContent;

/// Base URLs of the Google Cloud APIs the client talks to
#[derive(Clone, Debug)]
pub struct ApiEndpoints {
    pub secret_manager: String,
    pub resource_manager: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            secret_manager: SECRET_MANAGER_URL.to_owned(),
            resource_manager: RESOURCE_MANAGER_URL.to_owned(),
        }
    }
}

impl ApiEndpoints {
    /// Point every API at the same base URL, e.g. a local mock server
    pub fn single(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            secret_manager: base_url.clone(),
            resource_manager: base_url,
        }
    }
}

#[derive(Clone)]
pub struct GcpApiClient {
    pub client: ClientWithMiddleware,
    pub endpoints: ApiEndpoints,
    access_token: Secret<String>,
}

impl GcpApiClient {
    pub fn new(
        access_token: Secret<String>,
        endpoints: ApiEndpoints,
        timeout: Option<u64>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Ok(proxy) = std::env::var("HTTPS_PROXY") {
            builder = builder.proxy(reqwest::Proxy::https(proxy).context("invalid HTTPS_PROXY")?);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("mcp-deploy/", env!("CARGO_PKG_VERSION"))),
        );

        let client = builder
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout.unwrap_or(60)))
            .build()
            .context("failed to build HTTP client")?;

        let builder = reqwest_middleware::ClientBuilder::new(client);

        #[cfg(feature = "tracing")]
        let builder = builder.with(LoggingMiddleware);

        Ok(Self {
            client: builder.build(),
            endpoints,
            access_token,
        })
    }

    fn set_auth_bearer(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(self.access_token.expose())
    }

    pub async fn get(&self, url: impl AsRef<str>) -> Result<Response> {
        let builder = self.set_auth_bearer(self.client.get(url.as_ref()));

        Ok(builder.send().await?)
    }

    pub async fn get_json<R: DeserializeOwned>(&self, url: impl AsRef<str>) -> Result<R> {
        self.get(url).await?.to_json().await
    }

    // Bodies are never logged here: `addVersion` bodies carry the secret payload.
    pub async fn post<T: Serialize>(&self, url: impl AsRef<str>, body: &T) -> Result<Response> {
        let builder = self
            .set_auth_bearer(self.client.post(url.as_ref()))
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(body)?);

        Ok(builder.send().await?)
    }

    pub async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        url: impl AsRef<str>,
        body: &T,
    ) -> Result<R> {
        self.post(url, body).await?.to_json().await
    }
}
