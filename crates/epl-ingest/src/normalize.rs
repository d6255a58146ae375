//! Flatten JSON records into a table.
//!
//! Nested objects become dotted column names (`team.id`), columns appear in the
//! order their keys are first seen, and a key missing from a record is a null in
//! that row. Column types are inferred from the non-null values:
//!
//! | values seen            | column type |
//! |------------------------|-------------|
//! | integers only          | `Int64`     |
//! | integers and floats    | `Float64`   |
//! | booleans only          | `Boolean`   |
//! | anything else or mixed | `String`    |
//!
//! Arrays and mixed values are kept as JSON text.

use std::collections::HashMap;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, PolarsResult, Series};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Integer,
    Float,
    Boolean,
    Text,
}

/// Build a table from JSON object records.
///
/// Non-object records contribute an all-null row. No records yields an empty
/// table with no columns.
pub fn records_to_frame(records: &[Value]) -> PolarsResult<DataFrame> {
    let mut order: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut cells: Vec<Vec<Option<Value>>> = Vec::new();

    for (row, record) in records.iter().enumerate() {
        let Value::Object(map) = record else {
            continue;
        };
        let mut flat = Vec::new();
        flatten(None, map, &mut flat);
        for (key, value) in flat {
            let col = *index.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                cells.push(vec![None; records.len()]);
                cells.len() - 1
            });
            cells[col][row] = (!value.is_null()).then_some(value);
        }
    }

    let columns: Vec<Column> = order
        .into_iter()
        .zip(cells)
        .map(|(name, values)| build_column(&name, &values))
        .collect();
    DataFrame::new(columns)
}

fn flatten(prefix: Option<&str>, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten(Some(&name), inner, out),
            Value::Object(_) => out.push((name, Value::Null)),
            other => out.push((name, other.clone())),
        }
    }
}

fn kind_of(value: &Value) -> Kind {
    match value {
        Value::Bool(_) => Kind::Boolean,
        Value::Number(n) if n.is_i64() => Kind::Integer,
        Value::Number(_) => Kind::Float,
        _ => Kind::Text,
    }
}

fn column_kind(values: &[Option<Value>]) -> Kind {
    values
        .iter()
        .flatten()
        .map(kind_of)
        .reduce(|acc, kind| match (acc, kind) {
            (a, b) if a == b => a,
            (Kind::Integer, Kind::Float) | (Kind::Float, Kind::Integer) => Kind::Float,
            _ => Kind::Text,
        })
        .unwrap_or(Kind::Text)
}

fn build_column(name: &str, values: &[Option<Value>]) -> Column {
    let series = match column_kind(values) {
        Kind::Integer => {
            let data: Vec<Option<i64>> = values
                .iter()
                .map(|v| v.as_ref().and_then(Value::as_i64))
                .collect();
            Series::new(name.into(), data)
        }
        Kind::Float => {
            let data: Vec<Option<f64>> = values
                .iter()
                .map(|v| v.as_ref().and_then(Value::as_f64))
                .collect();
            Series::new(name.into(), data)
        }
        Kind::Boolean => {
            let data: Vec<Option<bool>> = values
                .iter()
                .map(|v| v.as_ref().and_then(Value::as_bool))
                .collect();
            Series::new(name.into(), data)
        }
        Kind::Text => {
            let data: Vec<Option<String>> = values
                .iter()
                .map(|v| v.as_ref().map(value_text))
                .collect();
            Series::new(name.into(), data)
        }
    };
    series.into_column()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
