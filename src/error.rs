//! Errors raised while turning API rows into typed records.
//!
//! Extraction and mapping never fail; only contract violations at the
//! ingestion boundary surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    /// A diagnosis code or paragraph row carried no group number.
    #[error("{kind} row {index} ({code}) has no group number")]
    MissingGroup {
        kind: &'static str,
        index: usize,
        code: String,
    },

    /// The group value was neither a number nor a string.
    #[error("{kind} row {index} has an unsupported group value: {value}")]
    InvalidGroup {
        kind: &'static str,
        index: usize,
        value: String,
    },

    /// The payload did not deserialize into the expected rows.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
