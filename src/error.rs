use std::path::PathBuf;
use thiserror::Error;

/// Acquiring listings from the source failed
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("browser automation failed: {0}")]
    Browser(String),
    #[error("fetch did not finish within {0:?}")]
    Timeout(std::time::Duration),
    #[error("no listing ids extracted from the source page")]
    Empty,
}

/// Reading or writing the persisted snapshot failed
#[derive(Error, Debug)]
pub enum StateError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Delivering an alert failed
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Checking that a listing resolves failed
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("verification request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Startup configuration is missing or invalid
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// A failed cycle, as seen by the scheduler loop
#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Persist(#[from] StateError),
}

impl CycleError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Fetch(FetchError::Empty) => "empty-result",
            CycleError::Fetch(_) => "fetch",
            CycleError::Persist(_) => "persist",
        }
    }
}
