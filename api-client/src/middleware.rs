use std::time::Instant;

use http::Extensions;
use mcp_deploy_common::models::ErrorKind;
use reqwest::{Request, Response, Url};
use reqwest_middleware::{Middleware, Next};
use tracing::{debug, warn};

/// Traces every Google Cloud API call with its outcome and how long it took.
///
/// Only the method and the url path make it into the log. Headers, bodies and
/// query strings stay out.
pub struct LoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let url = loggable_url(req.url());
        let started = Instant::now();
        debug!(%method, %url, "calling Google Cloud API");

        let res = next.run(req, extensions).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &res {
            Ok(res) if res.status().is_success() => {
                debug!(%method, %url, status = %res.status(), elapsed_ms, "API call succeeded");
            }
            Ok(res) => {
                let kind = ErrorKind::from_status_code(res.status());
                debug!(%method, %url, status = %res.status(), %kind, elapsed_ms, "API call failed");
            }
            Err(e) => {
                warn!(%method, %url, elapsed_ms, error = %e, "API call did not complete");
            }
        }

        res
    }
}

/// The url without credentials, query or fragment
fn loggable_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    // only fails for urls that cannot carry credentials in the first place
    let _ = url.set_username("");
    let _ = url.set_password(None);

    url.to_string()
}
