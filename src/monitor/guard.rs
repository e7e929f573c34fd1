use crate::models::{ListingId, Snapshot};
use std::collections::BTreeSet;
use std::fmt;

/// Why a diff did not produce an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// No earlier snapshot; this cycle only seeds state
    BaselineEstablishment,
    NoChange,
    /// More new ids than the ceiling; usually extraction re-discovering known listings
    LikelyRestartOrExtractionChange,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::BaselineEstablishment => "baseline-establishment",
            SuppressReason::NoChange => "no-change",
            SuppressReason::LikelyRestartOrExtractionChange => "likely-restart-or-extraction-change",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Suppressed(SuppressReason),
    Alertable(BTreeSet<ListingId>),
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Suppressed(reason) => reason.as_str(),
            Decision::Alertable(_) => "alertable",
        }
    }
}

/// Decides whether newly seen ids are worth telling anyone about.
#[derive(Debug, Clone, Copy)]
pub struct FloodGuard {
    ceiling: usize,
}

impl FloodGuard {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Only the added set is considered; disappearing listings never alert.
    pub fn decide(&self, previous: Option<&Snapshot>, added: BTreeSet<ListingId>) -> Decision {
        if previous.is_none() {
            return Decision::Suppressed(SuppressReason::BaselineEstablishment);
        }
        if added.is_empty() {
            return Decision::Suppressed(SuppressReason::NoChange);
        }
        if added.len() > self.ceiling {
            return Decision::Suppressed(SuppressReason::LikelyRestartOrExtractionChange);
        }
        Decision::Alertable(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> BTreeSet<ListingId> {
        (0..n)
            .map(|i| ListingId::parse(&format!("00000000-0000-0000-0000-{i:012x}")).unwrap())
            .collect()
    }

    #[test]
    fn first_run_never_alerts() {
        let guard = FloodGuard::new(5);
        for n in [0, 1, 5, 50] {
            assert_eq!(
                guard.decide(None, ids(n)),
                Decision::Suppressed(SuppressReason::BaselineEstablishment)
            );
        }
    }

    #[test]
    fn empty_added_set_is_no_change() {
        let previous = Snapshot::default();
        assert_eq!(
            FloodGuard::new(5).decide(Some(&previous), BTreeSet::new()),
            Decision::Suppressed(SuppressReason::NoChange)
        );
    }

    #[test]
    fn ceiling_is_inclusive() {
        let previous = Snapshot::new(ids(3));
        let guard = FloodGuard::new(5);

        assert_eq!(guard.decide(Some(&previous), ids(1)), Decision::Alertable(ids(1)));
        assert_eq!(guard.decide(Some(&previous), ids(5)), Decision::Alertable(ids(5)));
        assert_eq!(
            guard.decide(Some(&previous), ids(6)),
            Decision::Suppressed(SuppressReason::LikelyRestartOrExtractionChange)
        );
    }

    #[test]
    fn empty_previous_snapshot_is_not_a_baseline() {
        let previous = Snapshot::default();
        assert_eq!(
            FloodGuard::new(5).decide(Some(&previous), ids(2)),
            Decision::Alertable(ids(2))
        );
    }

    #[test]
    fn reason_labels() {
        assert_eq!(SuppressReason::BaselineEstablishment.to_string(), "baseline-establishment");
        assert_eq!(SuppressReason::NoChange.to_string(), "no-change");
        assert_eq!(
            SuppressReason::LikelyRestartOrExtractionChange.to_string(),
            "likely-restart-or-extraction-change"
        );
    }
}
