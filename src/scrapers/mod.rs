pub mod browser;
pub mod extract;
pub mod http;
pub mod traits;
pub mod types;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;
pub use traits::SourceFetcher;

/// Desktop Chrome user agent sent by every fetcher
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
