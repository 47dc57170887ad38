//! HTTP client creation and request handling for RSS feeds.

use anyhow::Result;
use reqwest::{cookie::Jar, header};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::debug;

use super::types::REQUEST_TIMEOUT;
use crate::TARGET_WEB_REQUEST;

const FEED_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Create a client suitable for fetching feeds and article pages.
pub fn create_http_client() -> Result<reqwest::Client> {
    let cookie_store = Jar::default();
    let builder = reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .redirect(reqwest::redirect::Policy::default());

    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

/// Fetch a feed URL, returning the response body on success.
pub async fn fetch_feed_body(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!(target: TARGET_WEB_REQUEST, "Loading RSS feed from {}", url);

    let response = timeout(
        REQUEST_TIMEOUT,
        client
            .get(url)
            .header(header::USER_AGENT, FEED_USER_AGENT)
            .header(
                header::ACCEPT,
                "application/rss+xml, application/atom+xml, application/xml, text/xml, */*;q=0.9",
            )
            .send(),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Request to {} timed out", url))?
    .map_err(|e| anyhow::anyhow!("Request to {} failed: {}", url, e))?;

    if !response.status().is_success() {
        anyhow::bail!("Non-success status {} from {}", response.status(), url);
    }

    response
        .text()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body from {}: {}", url, e))
}
