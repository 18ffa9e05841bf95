//! Shared HTTP plumbing for connectors
//!
//! One client serves the whole pipeline; per-call timeouts come from the
//! source settings and are applied per request.

use std::time::Duration;

use reqwest::Client;

use crate::config::UserAgentConfig;
use crate::{HarvestError, Result};

/// Default timeout for page fetches
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for API calls
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(20);

/// Fixed politeness delay between successive page fetches within one source
pub const PAGE_FETCH_DELAY: Duration = Duration::from_secs(1);

/// Fixed politeness delay before each detail-page fetch
pub const DETAIL_FETCH_DELAY: Duration = Duration::from_millis(500);

/// Builds the HTTP client shared by all connectors
///
/// User agent format: CollectorName/Version (+ContactURL; ContactEmail)
pub fn build_http_client(config: &UserAgentConfig) -> std::result::Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.collector_name, config.collector_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL body as text with a per-call timeout
///
/// Timeouts and network failures are classified into the error taxonomy;
/// non-2xx statuses are hard failures for the calling source.
pub async fn fetch_text(client: &Client, url: &str, timeout: Duration) -> Result<String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify_error(url, e))
}

/// Fetches a URL body and parses it as JSON
pub async fn fetch_json(client: &Client, url: &str, timeout: Duration) -> Result<serde_json::Value> {
    let body = fetch_text(client, url, timeout).await?;
    serde_json::from_str(&body).map_err(|e| HarvestError::PayloadShape {
        url: url.to_string(),
        message: format!("invalid JSON: {}", e),
    })
}

fn classify_error(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
