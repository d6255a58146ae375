use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid table reference: {0}")]
    InvalidTableRef(String),
    #[error("unknown scalar type: {0}")]
    UnknownScalarType(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
