//! Error types for ingestion.

use polars::prelude::PolarsError;
use thiserror::Error;

/// A single upstream request failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The API answered with a non-200 status.
    #[error("API returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },

    /// Connection, TLS, or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response was not the expected JSON envelope.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The client could not be built (bad header value, bad base URL).
    #[error("client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Writing a raw payload to the archive failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("could not serialize payload: {0}")]
    Serialize(String),

    #[error("object store error: {0}")]
    Store(String),

    #[error("archive configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<object_store::Error> for ArchiveError {
    fn from(err: object_store::Error) -> Self {
        Self::Store(err.to_string())
    }
}

/// Why one key of a collection run was skipped.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("no records returned")]
    Empty,

    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// A collection run could not produce its combined table.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not build table from records: {0}")]
    Normalize(#[from] PolarsError),
}
