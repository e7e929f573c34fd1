pub mod backoff;
pub mod cycle;
pub mod diff;
pub mod guard;
pub mod normalize;
pub mod store;

pub use backoff::{BackoffController, BackoffGrowth, BackoffPolicy};
pub use cycle::{CycleReport, Monitor, NotifyStatus};
pub use diff::diff;
pub use guard::{Decision, FloodGuard, SuppressReason};
pub use normalize::{normalize, Normalized};
pub use store::{JsonFileStore, SnapshotStore};
