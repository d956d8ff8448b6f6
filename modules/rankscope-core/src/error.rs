//! Typed errors for rank checking and aggregation.

use pixelplus_client::PixelPlusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    /// A record lacks a required field. Rejects the record, not the run.
    #[error("malformed input at record {record}: missing {field}")]
    MalformedInput { record: u64, field: String },

    /// Submission budget exhausted. The url is skipped for this run.
    #[error("task creation failed for {url} after {attempts} attempts: {last_error}")]
    TaskCreationFailed {
        url: String,
        attempts: u32,
        #[source]
        last_error: Box<RankError>,
    },

    /// Polling budget exhausted. The report is skipped for this run.
    #[error("result retrieval failed for report {report_id} after {attempts} attempts: {last_error}")]
    ResultRetrievalFailed {
        report_id: String,
        attempts: u32,
        #[source]
        last_error: Box<RankError>,
    },

    /// Success status, but the body lacks the field we need.
    #[error("unexpected response shape: missing `{field}`")]
    UnexpectedResponseShape { field: &'static str },

    #[error("transport error: {0}")]
    Transport(#[from] PixelPlusError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RankError>;
