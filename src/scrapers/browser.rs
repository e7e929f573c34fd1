use crate::error::FetchError;
use crate::scrapers::extract::extract_listings;
use crate::scrapers::traits::SourceFetcher;
use crate::scrapers::types::Extraction;
use crate::scrapers::USER_AGENT;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Renders the source page in headless Chrome before extracting, for
/// listings that only exist after client-side rendering.
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    url: String,
    timeout: Duration,
    settle: Duration,
}

impl BrowserFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration, settle: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            settle,
        }
    }

    /// Grab the rendered HTML. A fresh browser per call; it is torn down when
    /// `browser` drops, so a wedged Chrome never outlives one cycle.
    fn render(&self) -> Result<String> {
        info!(timeout_secs = self.timeout.as_secs(), "launching headless chrome");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .idle_browser_timeout(self.timeout)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open tab")?;
        tab.set_default_timeout(self.timeout);
        tab.set_user_agent(USER_AGENT, None, None)?;

        info!(url = %self.url, "opening listing page");
        tab.navigate_to(&self.url)?;
        tab.wait_until_navigated()
            .context("Page did not finish navigating")?;

        // Listing cards are rendered client-side after navigation completes
        thread::sleep(self.settle);

        let html = tab
            .evaluate("document.documentElement.outerHTML", false)?
            .value
            .and_then(|value| value.as_str().map(String::from))
            .unwrap_or_default();

        if html.is_empty() {
            warn!(url = %self.url, "rendered page came back empty");
        } else {
            debug!(bytes = html.len(), "captured rendered page");
        }

        Ok(html)
    }
}

#[async_trait]
impl SourceFetcher for BrowserFetcher {
    async fn fetch(&self) -> Result<Vec<Extraction>, FetchError> {
        let fetcher = self.clone();
        let html = tokio::task::spawn_blocking(move || fetcher.render())
            .await
            .map_err(|e| FetchError::Browser(format!("browser task aborted: {e}")))?
            .map_err(|e| FetchError::Browser(format!("{e:#}")))?;

        Ok(extract_listings(&html))
    }

    fn source_name(&self) -> &'static str {
        "browser"
    }
}
