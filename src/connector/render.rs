//! Scripted page rendering for `method: dynamic` sources
//!
//! Some listing pages build their rows client-side and are empty to a plain
//! fetch. With the `browser` feature enabled these are loaded in a headless
//! browser and the rendered DOM is returned; without it, dynamic sources
//! degrade to a static fetch with a warning.

use std::time::Duration;

use reqwest::Client;

use crate::Result;

#[cfg(feature = "browser")]
pub async fn render_page(
    _client: &Client,
    url: &str,
    wait_for_selector: Option<&str>,
    timeout: Duration,
) -> Result<String> {
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;

    use crate::HarvestError;

    let config = BrowserConfig::builder()
        .build()
        .map_err(HarvestError::Render)?;

    let (mut browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| HarvestError::Render(e.to_string()))?;
    let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

    let result = async {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| HarvestError::Render(e.to_string()))?;
        let _ = page.wait_for_navigation().await;

        if let Some(selector) = wait_for_selector {
            if tokio::time::timeout(timeout, page.find_element(selector))
                .await
                .is_err()
            {
                tracing::warn!("timed out waiting for selector '{}' on {}", selector, url);
            }
        }

        page.content()
            .await
            .map_err(|e| HarvestError::Render(e.to_string()))
    }
    .await;

    let _ = browser.close().await;
    let _ = handler_task.await;

    result
}

#[cfg(not(feature = "browser"))]
pub async fn render_page(
    client: &Client,
    url: &str,
    _wait_for_selector: Option<&str>,
    timeout: Duration,
) -> Result<String> {
    tracing::warn!(
        "dynamic rendering unavailable (browser feature disabled); static fetch for {}",
        url
    );
    crate::connector::http::fetch_text(client, url, timeout).await
}
