//! Error types surfaced to callers
//!
//! Validation failures are typed so callers can tell a rejected record from an
//! I/O or storage failure (which travel as `anyhow::Error`).

use thiserror::Error;

/// Reasons a record is rejected before it is stored or laid out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required header field is empty
    #[error("invalid record: missing required field `{0}`")]
    MissingField(&'static str),

    /// No hazard rows remain after skipping blank ones
    #[error("invalid record: at least one hazard row is required")]
    NoRows,

    /// A hazard row failed validation
    #[error("invalid record: {0}")]
    InvalidRow(String),
}

/// Lookup of an evaluation id that is not in the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("IPERC not found: {id}")]
pub struct NotFound {
    pub id: String,
}
