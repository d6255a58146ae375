use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// Zero rows or zero columns; nothing was sent.
    #[error("refusing to load an empty table")]
    EmptyInput,

    #[error("could not encode table as CSV: {0}")]
    Encode(String),

    /// Connection, COPY or commit failure. The transaction was rolled back.
    #[error("database error: {0}")]
    Transport(String),
}

impl From<PolarsError> for LoadError {
    fn from(err: PolarsError) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<sqlx::Error> for LoadError {
    fn from(err: sqlx::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
