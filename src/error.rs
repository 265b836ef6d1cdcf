//! Error taxonomy for the ingestion pipeline.
//!
//! Every variant maps to a rejected ingestion and a cleaned-up transient
//! file; none is fatal to the serving process. Row-level normalization
//! misses (a row without a usable name or phone) are silent exclusions,
//! not errors — see [`crate::normalize`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The request carried no file payload.
    #[error("no file was uploaded")]
    MissingFile,

    /// The file extension is not one of `.csv`, `.xlsx`, `.xls`.
    #[error("unsupported file format '{0}': only CSV, XLSX, and XLS files are allowed")]
    UnsupportedFormat(String),

    /// The agent directory returned no active agents.
    #[error("no active agents found; add agents before uploading a list")]
    NoActiveAgents,

    /// Parsing completed but produced zero valid records.
    #[error("no valid records found in file; rows need a first-name column and a phone column")]
    EmptyDataset,

    /// The upload exceeds the configured size ceiling.
    #[error("file of {size} bytes exceeds the upload limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// The transient file stream failed mid-read.
    #[error("failed to read uploaded file: {0}")]
    Io(#[from] std::io::Error),

    /// The file bytes could not be decoded as the selected format.
    #[error("failed to parse uploaded file: {0}")]
    Parse(String),

    /// The persistence layer rejected the write or read.
    #[error("storage error: {0}")]
    Persistence(#[from] sqlx::Error),
}
