use anyhow::{Context, Result};
use listing_watch::config::{FetchMode, Settings};
use listing_watch::monitor::{FloodGuard, JsonFileStore, Monitor};
use listing_watch::notifiers::{HttpVerifier, ResendNotifier};
use listing_watch::scrapers::{BrowserFetcher, HttpFetcher, SourceFetcher};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    listing_watch::init_logging();

    info!(version = env!("CARGO_PKG_VERSION"), "listing watch starting");

    // Startup errors are fatal; everything after this is retried per cycle
    let monitor = match assemble() {
        Ok(monitor) => monitor,
        Err(e) => {
            error!(error = %format!("{e:#}"), "fatal startup error");
            return Err(e);
        }
    };

    monitor.run(shutdown_signal()).await;
    Ok(())
}

fn assemble() -> Result<Monitor> {
    let settings = Settings::from_env().context("Invalid configuration")?;

    let fetcher: Box<dyn SourceFetcher> = match settings.fetch_mode {
        FetchMode::Browser => Box::new(BrowserFetcher::new(
            settings.source_url.clone(),
            settings.fetch_timeout(),
            settings.page_settle(),
        )),
        FetchMode::Http => Box::new(
            HttpFetcher::new(settings.source_url.clone(), settings.fetch_timeout())
                .context("Failed to create HTTP client")?,
        ),
    };

    let notifier = ResendNotifier::new(settings.email_settings()?)
        .context("Failed to create e-mail client")?;

    info!(
        source = %settings.source_url,
        state_file = %settings.state_file.display(),
        interval_secs = settings.check_interval,
        mode = fetcher.source_name(),
        "configuration loaded"
    );

    let mut monitor = Monitor::new(
        fetcher,
        Box::new(notifier),
        Box::new(JsonFileStore::new(settings.state_file.clone())),
        FloodGuard::new(settings.mass_change_ceiling),
        settings.backoff_policy(),
    );

    if settings.verify_listings {
        let verifier = HttpVerifier::new(settings.listing_url_base.clone())
            .context("Failed to create verification client")?;
        monitor = monitor.with_verifier(Box::new(verifier));
    }

    Ok(monitor)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown requested, stopping after the current cycle");
}
