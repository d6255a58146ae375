//! Read-only diagnostics over one table.

use std::collections::{BTreeMap, BTreeSet};

use epl_model::ScalarType;
use polars::prelude::{DataFrame, DataType, UniqueKeepStrategy};
use tracing::{info, warn};

use crate::report::{QualityReport, SchemaDiff, TypeDiff, TypeMismatch};

/// Diagnostics over a borrowed table.
#[derive(Debug, Clone, Copy)]
pub struct QualityChecker<'a> {
    df: &'a DataFrame,
}

impl<'a> QualityChecker<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    /// Null count for every column that has at least one null.
    pub fn null_counts(&self) -> BTreeMap<String, usize> {
        let counts: BTreeMap<String, usize> = self
            .df
            .get_columns()
            .iter()
            .filter(|column| column.null_count() > 0)
            .map(|column| (column.name().to_string(), column.null_count()))
            .collect();
        if counts.is_empty() {
            info!("no nulls in table");
        } else {
            warn!(columns = ?counts, "table contains nulls");
        }
        counts
    }

    /// Number of rows that exactly repeat an earlier row.
    ///
    /// Nulls compare equal to each other. `None` if the table cannot be
    /// deduplicated, e.g. it has no columns.
    pub fn duplicate_rows(&self) -> Option<usize> {
        let distinct = match self
            .df
            .unique_stable(None, UniqueKeepStrategy::First, None)
        {
            Ok(distinct) => distinct,
            Err(error) => {
                warn!(%error, "duplicate check failed");
                return None;
            }
        };
        let duplicates = self.df.height().saturating_sub(distinct.height());
        if duplicates > 0 {
            warn!(duplicates, "table contains duplicate rows");
        } else {
            info!("no duplicate rows in table");
        }
        Some(duplicates)
    }

    /// Compare the actual column names against `expected`.
    pub fn diff_schema<I, S>(&self, expected: I) -> SchemaDiff
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let actual: BTreeSet<String> = self
            .df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let expected: BTreeSet<String> = expected
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        if actual == expected {
            info!("no schema drift detected");
            return SchemaDiff::Match { columns: actual };
        }
        let missing: BTreeSet<String> = expected.difference(&actual).cloned().collect();
        let extra: BTreeSet<String> = actual.difference(&expected).cloned().collect();
        if !missing.is_empty() {
            warn!(columns = ?missing, "missing columns");
        }
        if !extra.is_empty() {
            warn!(columns = ?extra, "unexpected columns");
        }
        SchemaDiff::Drift { missing, extra }
    }

    /// Compare column types against `expected`.
    ///
    /// An expected column that does not exist cannot be compared, so the whole
    /// check reports `None` with a warning.
    pub fn diff_types(&self, expected: &BTreeMap<String, ScalarType>) -> Option<TypeDiff> {
        let mut mismatched = BTreeMap::new();
        for (name, expected_type) in expected {
            let Ok(column) = self.df.column(name) else {
                warn!(column = %name, "type check failed: column not found");
                return None;
            };
            let actual = ScalarType::from_dtype(column.dtype());
            if actual != Some(*expected_type) {
                mismatched.insert(
                    name.clone(),
                    TypeMismatch {
                        expected: *expected_type,
                        actual: type_label(column.dtype()),
                    },
                );
            }
        }
        if mismatched.is_empty() {
            info!("all column types match expectations");
            let types = self
                .df
                .get_columns()
                .iter()
                .map(|column| (column.name().to_string(), type_label(column.dtype())))
                .collect();
            Some(TypeDiff::Match { types })
        } else {
            warn!(columns = ?mismatched.keys().collect::<Vec<_>>(), "column type mismatches");
            Some(TypeDiff::Mismatch {
                columns: mismatched,
            })
        }
    }

    /// Run every diagnostic. Schema and type checks only run when expectations
    /// are supplied.
    pub fn report(
        &self,
        expected_columns: Option<&[&str]>,
        expected_types: Option<&BTreeMap<String, ScalarType>>,
    ) -> QualityReport {
        QualityReport {
            rows: self.df.height(),
            null_counts: self.null_counts(),
            duplicate_rows: self.duplicate_rows(),
            schema: expected_columns.map(|columns| self.diff_schema(columns.iter())),
            types: expected_types.and_then(|types| self.diff_types(types)),
        }
    }
}

fn type_label(dtype: &DataType) -> String {
    match ScalarType::from_dtype(dtype) {
        Some(scalar) => scalar.as_str().to_string(),
        None => dtype.to_string(),
    }
}
