use crate::error::FetchError;
use crate::scrapers::types::Extraction;
use async_trait::async_trait;

/// Anything that can look at the source and report the listings it sees.
/// How the page is acquired and which strategies run is up to the implementation.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// One extraction per strategy that ran, in the fetcher's priority order
    async fn fetch(&self) -> Result<Vec<Extraction>, FetchError>;

    /// Get the name of the fetcher
    fn source_name(&self) -> &'static str;
}
