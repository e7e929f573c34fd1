use crate::error::VerifyError;
use crate::models::ListingId;
use crate::notifiers::listing_url;
use crate::notifiers::traits::ListingVerifier;
use crate::scrapers::USER_AGENT;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// HEAD-requests a listing's detail page; a 200 after redirects means it exists.
pub struct HttpVerifier {
    client: Client,
    listing_url_base: String,
}

impl HttpVerifier {
    pub fn new(listing_url_base: impl Into<String>) -> Result<Self, VerifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            listing_url_base: listing_url_base.into(),
        })
    }
}

#[async_trait]
impl ListingVerifier for HttpVerifier {
    async fn verify(&self, id: &ListingId) -> Result<bool, VerifyError> {
        let url = listing_url(&self.listing_url_base, id);
        let status = self.client.head(&url).send().await?.status();
        debug!(%url, %status, "verified listing");
        Ok(status == StatusCode::OK)
    }
}
