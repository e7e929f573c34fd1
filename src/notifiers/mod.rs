pub mod resend;
pub mod traits;
pub mod verify;

pub use resend::ResendNotifier;
pub use traits::{ListingVerifier, Notifier};
pub use verify::HttpVerifier;

use crate::models::ListingId;

/// Detail page of a listing
pub fn listing_url(base: &str, id: &ListingId) -> String {
    format!("{}/{}", base.trim_end_matches('/'), id)
}
