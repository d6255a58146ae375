use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("duplicate column name after rename: {0}")]
    DuplicateColumn(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, TransformError>;
