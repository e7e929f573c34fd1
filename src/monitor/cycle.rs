use crate::error::{CycleError, FetchError};
use crate::models::{DiffResult, ListingId, Snapshot};
use crate::monitor::backoff::{BackoffController, BackoffPolicy};
use crate::monitor::diff::diff;
use crate::monitor::guard::{Decision, FloodGuard, SuppressReason};
use crate::monitor::normalize::{normalize, Normalized};
use crate::monitor::store::SnapshotStore;
use crate::notifiers::{ListingVerifier, Notifier};
use crate::scrapers::SourceFetcher;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// What happened to the alert for a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyStatus {
    /// The flood guard suppressed the diff
    NotAttempted,
    /// Every new listing was confirmed gone
    NoneVerified,
    Sent(usize),
    Failed,
}

/// Summary of one successful cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub listings: usize,
    pub strategy: Option<&'static str>,
    pub added: usize,
    pub removed: usize,
    pub decision: Decision,
    pub notification: NotifyStatus,
}

/// Runs fetch → normalize → diff → decide → notify → persist, forever.
pub struct Monitor {
    fetcher: Box<dyn SourceFetcher>,
    notifier: Box<dyn Notifier>,
    verifier: Option<Box<dyn ListingVerifier>>,
    store: Box<dyn SnapshotStore>,
    guard: FloodGuard,
    backoff: BackoffController,
}

impl Monitor {
    pub fn new(
        fetcher: Box<dyn SourceFetcher>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn SnapshotStore>,
        guard: FloodGuard,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            verifier: None,
            store,
            guard,
            backoff: BackoffController::new(policy),
        }
    }

    /// Check new listings resolve before alerting on them.
    pub fn with_verifier(mut self, verifier: Box<dyn ListingVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn backoff(&self) -> &BackoffController {
        &self.backoff
    }

    /// One full cycle. The snapshot is only written once the fetch produced
    /// at least one valid listing, so a broken extraction can never wipe the
    /// ids tracked so far.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let extractions = self.fetcher.fetch().await?;
        let normalized = normalize(extractions);
        if normalized.is_empty() {
            return Err(FetchError::Empty.into());
        }

        let current = normalized.snapshot();
        info!(
            source = self.fetcher.source_name(),
            strategy = normalized.strategy.unwrap_or_default(),
            listings = current.len(),
            "found listings"
        );

        let previous = self.store.load().await;
        let delta = previous
            .as_ref()
            .map(|previous| diff(previous, &current))
            .unwrap_or_default();
        let (added, removed) = (delta.added.len(), delta.removed.len());

        let decision = self.guard.decide(previous.as_ref(), delta.added.clone());
        let notification = match &decision {
            Decision::Alertable(ids) => {
                info!(added, "potential new listings");
                self.alert(&normalized, ids).await
            }
            Decision::Suppressed(reason) => {
                self.log_suppressed(*reason, &current, &delta);
                NotifyStatus::NotAttempted
            }
        };

        self.store.save(&current).await?;

        Ok(CycleReport {
            listings: current.len(),
            strategy: normalized.strategy,
            added,
            removed,
            decision,
            notification,
        })
    }

    /// Run a cycle, fold the outcome into the backoff state and return how
    /// long to wait before the next one. Never fails.
    pub async fn step(&mut self) -> Duration {
        match self.run_cycle().await {
            Ok(report) => {
                self.backoff.record_success();
                info!(
                    listings = report.listings,
                    added = report.added,
                    removed = report.removed,
                    decision = report.decision.label(),
                    notification = ?report.notification,
                    "cycle complete"
                );
            }
            Err(e) => {
                self.backoff.record_failure();
                error!(
                    kind = e.kind(),
                    error = %e,
                    failures = self.backoff.failures(),
                    "cycle failed"
                );
            }
        }

        let delay = self.backoff.next_delay();
        if self.backoff.is_penalized() {
            warn!(delay_secs = delay.as_secs(), failures = self.backoff.failures(), "backing off");
        }
        delay
    }

    /// Cycle until `shutdown` resolves. Shutdown is only observed while
    /// sleeping; an in-flight cycle always runs to completion.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            ceiling = self.guard.ceiling(),
            interval_secs = self.backoff.next_delay().as_secs(),
            "monitor started"
        );

        loop {
            let delay = self.step().await;
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => break,
            }
        }

        info!("monitor stopped");
    }

    async fn alert(&self, normalized: &Normalized, added: &BTreeSet<ListingId>) -> NotifyStatus {
        let confirmed = self.verified(added).await;
        if confirmed.is_empty() {
            info!(added = added.len(), "no new listing could be verified, skipping notification");
            return NotifyStatus::NoneVerified;
        }

        let records = normalized.records_for(confirmed.iter());
        match self.notifier.notify(&records).await {
            Ok(()) => NotifyStatus::Sent(records.len()),
            Err(e) => {
                error!(error = %e, listings = records.len(), "notification failed");
                NotifyStatus::Failed
            }
        }
    }

    async fn verified(&self, added: &BTreeSet<ListingId>) -> Vec<ListingId> {
        let Some(verifier) = &self.verifier else {
            return added.iter().cloned().collect();
        };

        let mut confirmed = Vec::with_capacity(added.len());
        for id in added {
            match verifier.verify(id).await {
                Ok(true) => confirmed.push(id.clone()),
                Ok(false) => info!(%id, "listing does not resolve, dropping"),
                // only a definite answer drops an id; the snapshot is saved regardless
                Err(e) => {
                    warn!(%id, error = %e, "could not verify listing, alerting anyway");
                    confirmed.push(id.clone());
                }
            }
        }
        confirmed
    }

    fn log_suppressed(&self, reason: SuppressReason, current: &Snapshot, delta: &DiffResult) {
        match reason {
            SuppressReason::BaselineEstablishment => {
                info!(listings = current.len(), "first run, tracking listings without alerting")
            }
            SuppressReason::NoChange => info!(removed = delta.removed.len(), "no new listings"),
            SuppressReason::LikelyRestartOrExtractionChange => warn!(
                added = delta.added.len(),
                removed = delta.removed.len(),
                ceiling = self.guard.ceiling(),
                "too many new listings at once, suppressing alert"
            ),
        }
    }
}
