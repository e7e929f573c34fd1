use crate::error::FetchError;
use crate::scrapers::extract::extract_listings;
use crate::scrapers::traits::SourceFetcher;
use crate::scrapers::types::Extraction;
use crate::scrapers::USER_AGENT;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fetches the server-rendered page with a plain GET.
pub struct HttpFetcher {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<Extraction>, FetchError> {
        info!(url = %self.url, "fetching listing page");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Http(e)
            }
        })?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "source returned an error status");
            return Err(FetchError::Status(response.status()));
        }

        let html = response.text().await?;
        debug!(bytes = html.len(), "downloaded listing page");

        Ok(extract_listings(&html))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
