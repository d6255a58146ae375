//! Quality report types.

use std::collections::{BTreeMap, BTreeSet};

use epl_model::ScalarType;
use serde::Serialize;

/// Result of comparing actual column names against an expected set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SchemaDiff {
    /// No drift; carries the actual column set.
    Match { columns: BTreeSet<String> },
    /// Expected columns that are absent, and present columns nobody expected.
    Drift {
        missing: BTreeSet<String>,
        extra: BTreeSet<String>,
    },
}

impl SchemaDiff {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

/// Expected vs actual type for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMismatch {
    pub expected: ScalarType,
    /// Actual type label: a scalar type name, or the polars dtype for nested data.
    pub actual: String,
}

/// Result of comparing actual column types against expectations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TypeDiff {
    /// Every expectation held; carries the type label of every column.
    Match { types: BTreeMap<String, String> },
    /// Only the columns whose type differs.
    Mismatch {
        columns: BTreeMap<String, TypeMismatch>,
    },
}

impl TypeDiff {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

/// Snapshot of every diagnostic for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub rows: usize,
    /// Columns with at least one null; empty means no nulls anywhere.
    pub null_counts: BTreeMap<String, usize>,
    pub duplicate_rows: Option<usize>,
    /// `None` when no expected schema was given or it could not be computed.
    pub schema: Option<SchemaDiff>,
    /// `None` when no expected types were given or they could not be checked.
    pub types: Option<TypeDiff>,
}

impl QualityReport {
    /// Number of distinct problems found (columns with nulls count individually).
    pub fn finding_count(&self) -> usize {
        let mut count = self.null_counts.len();
        if self.duplicate_rows.is_some_and(|dupes| dupes > 0) {
            count += 1;
        }
        if let Some(SchemaDiff::Drift { missing, extra }) = &self.schema {
            count += missing.len() + extra.len();
        }
        if let Some(TypeDiff::Mismatch { columns }) = &self.types {
            count += columns.len();
        }
        count
    }

    pub fn is_clean(&self) -> bool {
        self.finding_count() == 0
    }
}
