//! Chainable table cleaning.
//!
//! [`CleaningPipeline`] owns one [`DataFrame`] at a time. Every step consumes the
//! pipeline, derives the next table, and hands the pipeline back, so chains read
//! left to right and no caller can observe a half-applied step:
//!
//! ```ignore
//! let cleaned = CleaningPipeline::new(df)
//!     .drop_incomplete_rows()?
//!     .lowercase_column_names()?
//!     .fill_missing(FillValue::empty_text())?
//!     .materialize();
//! ```
//!
//! Failure policy differs by step. Structural problems (unknown column in
//! [`drop_columns`](CleaningPipeline::drop_columns), name collisions, a missing
//! column in [`select_columns`](CleaningPipeline::select_columns)) are errors.
//! [`cast_column_types`](CleaningPipeline::cast_column_types) is best-effort per
//! column and never fails.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDateTime, NaiveTime};
use epl_model::{FillValue, ScalarType, TypeCastSpec, cell_text};
use polars::prelude::{
    AnyValue, Column, DataFrame, DataType, IntoColumn, NamedFrom, PlSmallStr, Series, TimeUnit,
};
use tracing::{debug, info, warn};

use crate::datetime::{is_valid_pattern, parse_date, parse_datetime};
use crate::error::{Result, TransformError};
use crate::numeric::leading_integer;

/// Owned-value cleaning pipeline over a single table.
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    df: DataFrame,
}

impl CleaningPipeline {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Borrow the current table without ending the chain.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Terminal step: hand back the cleaned table.
    pub fn materialize(self) -> DataFrame {
        self.df
    }

    /// Remove every row that has a null in any column.
    pub fn drop_incomplete_rows(self) -> Result<Self> {
        let before = self.df.height();
        let df = self.df.drop_nulls::<String>(None)?;
        let dropped = before - df.height();
        if dropped > 0 {
            debug!(dropped, remaining = df.height(), "dropped incomplete rows");
        }
        Ok(Self { df })
    }

    /// Replace every null in every column with `value`.
    ///
    /// Columns that can hold the value keep their type (an integer fill into an
    /// integer column stays integer). Otherwise the column is widened to text,
    /// which is what a text fill into a numeric column needs.
    pub fn fill_missing(mut self, value: impl Into<FillValue>) -> Result<Self> {
        let value = value.into();
        let targets: Vec<String> = self
            .df
            .get_columns()
            .iter()
            .filter(|column| column.null_count() > 0)
            .map(|column| column.name().to_string())
            .collect();
        for name in targets {
            let filled = fill_column(self.df.column(&name)?, &value)?;
            self.df.with_column(filled)?;
            debug!(column = %name, value = %value, "filled missing values");
        }
        Ok(self)
    }

    /// Remove the named columns.
    ///
    /// An empty name list is a no-op with a warning. Every name must exist;
    /// nothing is dropped if one of them does not.
    pub fn drop_columns<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        if names.is_empty() {
            warn!("no columns specified to drop");
            return Ok(self);
        }
        if let Some(missing) = names
            .iter()
            .find(|name| self.df.get_column_index(name).is_none())
        {
            return Err(TransformError::ColumnNotFound(missing.clone()));
        }
        for name in &names {
            // A repeated name was already dropped by its first occurrence.
            if self.df.get_column_index(name).is_some() {
                self.df.drop_in_place(name)?;
            }
        }
        debug!(columns = ?names, "dropped columns");
        Ok(self)
    }

    /// Lowercase every column name. Two names that fold to the same lowercase
    /// form are a [`TransformError::DuplicateColumn`].
    pub fn lowercase_column_names(self) -> Result<Self> {
        let names: Vec<String> = self
            .df
            .get_column_names()
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
        let df = relabel(self.df, names)?;
        Ok(Self { df })
    }

    /// Rename columns in bulk.
    ///
    /// Renames apply simultaneously, so swapping two names works. Sources that do
    /// not exist are ignored. Empty names, or a mapping that would leave two
    /// columns with the same name, are [`TransformError::InvalidArgument`].
    pub fn rename_columns<I, K, V>(self, mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut renames: BTreeMap<String, String> = BTreeMap::new();
        for (from, to) in mapping {
            let (from, to) = (from.as_ref().trim(), to.as_ref().trim());
            if from.is_empty() || to.is_empty() {
                return Err(TransformError::InvalidArgument(format!(
                    "rename mapping contains an empty name ({from:?} -> {to:?})"
                )));
            }
            if renames.insert(from.to_string(), to.to_string()).is_some() {
                return Err(TransformError::InvalidArgument(format!(
                    "column {from:?} is renamed more than once"
                )));
            }
        }

        let mut names = Vec::with_capacity(self.df.width());
        for name in self.df.get_column_names() {
            match renames.remove(name.as_str()) {
                Some(target) => names.push(target),
                None => names.push(name.to_string()),
            }
        }
        if !renames.is_empty() {
            debug!(columns = ?renames.keys().collect::<Vec<_>>(), "rename sources not present");
        }
        if let Some(duplicate) = first_duplicate(&names) {
            return Err(TransformError::InvalidArgument(format!(
                "rename would produce duplicate column {duplicate:?}"
            )));
        }
        let df = relabel(self.df, names)?;
        Ok(Self { df })
    }

    /// Cast columns to the requested types, one column at a time.
    ///
    /// Unknown columns and failed casts are logged and skipped; the column keeps
    /// its original values and type. A cast fails when any non-null value cannot
    /// be represented in the target type.
    pub fn cast_column_types(mut self, spec: &TypeCastSpec) -> Result<Self> {
        for (name, target) in spec.iter() {
            let Ok(column) = self.df.column(name) else {
                warn!(column = %name, "column not found, skipping cast");
                continue;
            };
            if column.dtype() == &target.to_dtype() {
                debug!(column = %name, %target, "column already has target type");
                continue;
            }
            let result = column
                .as_materialized_series()
                .strict_cast(&target.to_dtype());
            match result {
                Ok(cast) => {
                    self.df.with_column(cast)?;
                    info!(column = %name, %target, "cast column");
                }
                Err(error) => {
                    warn!(column = %name, %target, %error, "could not cast column, leaving as-is");
                }
            }
        }
        Ok(self)
    }

    /// Parse a column as dates and format each value with `pattern`.
    ///
    /// Unparseable values become null.
    pub fn convert_date_to_string(mut self, column: &str, pattern: &str) -> Result<Self> {
        if !is_valid_pattern(pattern) {
            return Err(TransformError::InvalidArgument(format!(
                "invalid date pattern {pattern:?}"
            )));
        }
        let texts = column_texts(&self.df, column)?;
        let mut unparsed = 0usize;
        let formatted: Vec<Option<String>> = texts
            .iter()
            .map(|text| {
                let parsed = text.as_deref().and_then(parse_date_or_datetime);
                if text.is_some() && parsed.is_none() {
                    unparsed += 1;
                }
                parsed.map(|dt| dt.format(pattern).to_string())
            })
            .collect();
        if unparsed > 0 {
            warn!(column, unparsed, "unparseable dates set to null");
        }
        self.df.with_column(Series::new(column.into(), formatted))?;
        Ok(self)
    }

    /// Parse a column into a millisecond `Datetime` column.
    ///
    /// Unparseable values become null.
    pub fn convert_to_datetime(mut self, column: &str) -> Result<Self> {
        let texts = column_texts(&self.df, column)?;
        let mut unparsed = 0usize;
        let millis: Vec<Option<i64>> = texts
            .iter()
            .map(|text| {
                let parsed = text.as_deref().and_then(parse_datetime);
                if text.is_some() && parsed.is_none() {
                    unparsed += 1;
                }
                parsed.map(|dt| dt.and_utc().timestamp_millis())
            })
            .collect();
        if unparsed > 0 {
            warn!(column, unparsed, "unparseable datetimes set to null");
        }
        let series = Series::new(column.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        self.df.with_column(series)?;
        Ok(self)
    }

    /// Replace a column with the first integer token of each value.
    ///
    /// Values without digits become null.
    pub fn extract_numeric_prefix(mut self, column: &str) -> Result<Self> {
        let texts = column_texts(&self.df, column)?;
        let values: Vec<Option<i64>> = texts
            .iter()
            .map(|text| text.as_deref().and_then(leading_integer))
            .collect();
        self.df.with_column(Series::new(column.into(), values))?;
        Ok(self)
    }

    /// Keep exactly `names`, in that order.
    ///
    /// A missing column is a [`TransformError::ColumnNotFound`]: loading a table
    /// without it would silently break the destination schema.
    pub fn select_columns<I, S>(self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns: Vec<Column> = Vec::new();
        for name in names {
            let name = name.as_ref();
            let column = self
                .df
                .column(name)
                .map_err(|_| TransformError::ColumnNotFound(name.to_string()))?;
            columns.push(column.clone());
        }
        let df = DataFrame::new(columns)?;
        Ok(Self { df })
    }
}

fn parse_date_or_datetime(text: &str) -> Option<NaiveDateTime> {
    parse_datetime(text).or_else(|| parse_date(text).map(|d| d.and_time(NaiveTime::MIN)))
}

/// Text view of every cell in a column, `None` for nulls.
fn column_texts(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| TransformError::ColumnNotFound(name.to_string()))?;
    let mut texts = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        texts.push(cell_text(&column.get(idx).unwrap_or(AnyValue::Null)));
    }
    Ok(texts)
}

fn fill_column(column: &Column, value: &FillValue) -> Result<Column> {
    let name = column.name().clone();
    let series = column.as_materialized_series();
    let current = ScalarType::from_dtype(series.dtype());
    let filled = match (value, current) {
        (FillValue::Integer(v), Some(ScalarType::Integer)) => {
            let cast = series.cast(&DataType::Int64)?;
            let values: Vec<i64> = cast.i64()?.into_iter().map(|x| x.unwrap_or(*v)).collect();
            Series::new(name, values)
        }
        (FillValue::Integer(v), Some(ScalarType::Float)) => {
            fill_float(&name, series, *v as f64)?
        }
        (FillValue::Float(v), Some(ScalarType::Integer | ScalarType::Float)) => {
            fill_float(&name, series, *v)?
        }
        (FillValue::Boolean(v), Some(ScalarType::Boolean)) => {
            let values: Vec<bool> = series
                .bool()?
                .into_iter()
                .map(|x| x.unwrap_or(*v))
                .collect();
            Series::new(name, values)
        }
        _ => {
            let fill = match value {
                FillValue::Text(text) => text.clone(),
                FillValue::Integer(v) => v.to_string(),
                FillValue::Float(v) => epl_model::format_numeric(*v),
                FillValue::Boolean(v) => v.to_string(),
            };
            let values: Vec<String> = (0..series.len())
                .map(|idx| {
                    cell_text(&series.get(idx).unwrap_or(AnyValue::Null))
                        .unwrap_or_else(|| fill.clone())
                })
                .collect();
            Series::new(name, values)
        }
    };
    Ok(filled.into_column())
}

fn fill_float(name: &PlSmallStr, series: &Series, value: f64) -> Result<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = cast.f64()?.into_iter().map(|x| x.unwrap_or(value)).collect();
    Ok(Series::new(name.clone(), values))
}

/// Rebuild `df` with new column names, rejecting collisions.
fn relabel(df: DataFrame, names: Vec<String>) -> Result<DataFrame> {
    if let Some(duplicate) = first_duplicate(&names) {
        return Err(TransformError::DuplicateColumn(duplicate));
    }
    let columns: Vec<Column> = df
        .take_columns()
        .into_iter()
        .zip(names)
        .map(|(mut column, name)| {
            column.rename(name.into());
            column
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn first_duplicate(names: &[String]) -> Option<String> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .cloned()
}
