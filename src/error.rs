//! Error types for dstcheck.
//!
//! Only configuration and store errors escape a run. The per-record variants
//! are logged by the reconciliation loop and never abort it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DstError {
    #[error("{0} not set")]
    ConfigMissing(&'static str),

    #[error("{key} has invalid value {value:?}")]
    ConfigInvalid { key: &'static str, value: String },

    #[error("record store {} unavailable: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("records processed but not saved to {}: {reason}", path.display())]
    NotSaved { path: PathBuf, reason: String },

    #[error("no GMT offset annotation in location {0:?}")]
    MalformedLocation(String),

    #[error("transition oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("transition handler failed: {0}")]
    InvokerFailure(String),
}

impl DstError {
    /// True for errors that end the run rather than a single record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DstError::ConfigMissing(_)
                | DstError::ConfigInvalid { .. }
                | DstError::StoreUnavailable { .. }
                | DstError::NotSaved { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DstError>;
