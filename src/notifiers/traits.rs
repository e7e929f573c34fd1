use crate::error::{NotifyError, VerifyError};
use crate::models::{ListingId, ListingRecord};
use async_trait::async_trait;

/// Delivers an alert about newly appeared listings
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, added: &[ListingRecord]) -> Result<(), NotifyError>;
}

/// Confirms a listing actually resolves before anyone is told about it
#[async_trait]
pub trait ListingVerifier: Send + Sync {
    /// `Ok(false)` means the listing was checked and does not exist
    async fn verify(&self, id: &ListingId) -> Result<bool, VerifyError>;
}
