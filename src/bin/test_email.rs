//! Sends a single setup-confirmation e-mail using the daemon's configuration.

use anyhow::{Context, Result};
use listing_watch::config::Settings;
use listing_watch::notifiers::ResendNotifier;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    listing_watch::init_logging();

    let settings = Settings::from_env().context("Invalid configuration")?;
    let notifier = ResendNotifier::new(settings.email_settings()?)
        .context("Failed to create e-mail client")?;

    notifier
        .send_test()
        .await
        .context("Test e-mail was not accepted")?;

    info!("test e-mail accepted, check your inbox");
    Ok(())
}
