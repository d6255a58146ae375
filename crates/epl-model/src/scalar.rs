//! Scalar type vocabulary.
//!
//! Casts and type-drift checks speak in terms of [`ScalarType`] rather than raw
//! polars dtypes so that callers do not need to care about integer widths or
//! time units.

use std::fmt;
use std::str::FromStr;

use polars::prelude::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Target type for a column cast or an expected-type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// UTF-8 text.
    String,
    /// Calendar date without time.
    Date,
    /// Date and time, millisecond precision, no time zone.
    Datetime,
    /// Boolean.
    Boolean,
}

impl ScalarType {
    /// The polars dtype a column is cast to for this scalar type.
    #[must_use]
    pub fn to_dtype(self) -> DataType {
        match self {
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::String => DataType::String,
            Self::Date => DataType::Date,
            Self::Datetime => DataType::Datetime(TimeUnit::Milliseconds, None),
            Self::Boolean => DataType::Boolean,
        }
    }

    /// Classify a polars dtype. Nested and exotic dtypes have no scalar type.
    #[must_use]
    pub fn from_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Some(Self::Integer),
            DataType::Float32 | DataType::Float64 => Some(Self::Float),
            DataType::String => Some(Self::String),
            DataType::Date => Some(Self::Date),
            DataType::Datetime(_, _) => Some(Self::Datetime),
            DataType::Boolean => Some(Self::Boolean),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "int64" => Ok(Self::Integer),
            "float" | "float64" | "double" => Ok(Self::Float),
            "str" | "string" | "text" => Ok(Self::String),
            "date" => Ok(Self::Date),
            "datetime" | "timestamp" => Ok(Self::Datetime),
            "bool" | "boolean" => Ok(Self::Boolean),
            other => Err(ModelError::UnknownScalarType(other.to_string())),
        }
    }
}

/// Ordered column → target type mapping for best-effort casts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCastSpec {
    entries: Vec<(String, ScalarType)>,
}

impl TypeCastSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the target type for a column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, target: ScalarType) -> Self {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((column, target)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ScalarType)> {
        self.entries
            .iter()
            .map(|(name, target)| (name.as_str(), *target))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ScalarType)> for TypeCastSpec {
    fn from_iter<I: IntoIterator<Item = (S, ScalarType)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |spec, (column, target)| spec.with(column, target))
    }
}
