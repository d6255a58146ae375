//! Fill values for missing cells.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar written into every missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl FillValue {
    /// The empty string, which is what the cleaning recipes fill with.
    pub fn empty_text() -> Self {
        Self::Text(String::new())
    }
}

impl Default for FillValue {
    fn default() -> Self {
        Self::empty_text()
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FillValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FillValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FillValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
