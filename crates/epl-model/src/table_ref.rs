//! Load destinations.
//!
//! A [`TableRef`] is the only way a table name reaches a SQL statement, so every
//! identifier is checked against a conservative pattern and always emitted quoted.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A `schema.table` (or bare `table`) destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    schema: Option<String>,
    name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: &str) -> Result<Self, ModelError> {
        if let Some(schema) = schema {
            check_identifier(schema)?;
        }
        check_identifier(name)?;
        Ok(Self {
            schema: schema.map(str::to_string),
            name: name.to_string(),
        })
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quoted form for use in SQL, e.g. `"epl_datapipeline"."epl_teams"`.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{schema}\".\"{}\"", self.name),
            None => format!("\"{}\"", self.name),
        }
    }
}

fn check_identifier(ident: &str) -> Result<(), ModelError> {
    let mut chars = ident.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_start && valid_rest && ident.len() <= 63 {
        Ok(())
    } else {
        Err(ModelError::InvalidTableRef(ident.to_string()))
    }
}

impl FromStr for TableRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((schema, name)) => Self::new(Some(schema), name),
            None => Self::new(None, s),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
