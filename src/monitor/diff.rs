use crate::models::{DiffResult, Snapshot};

/// Ids that appeared in `current` and ids that vanished since `previous`.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> DiffResult {
    DiffResult {
        added: current.ids().difference(previous.ids()).cloned().collect(),
        removed: previous.ids().difference(current.ids()).cloned().collect(),
    }
}
