//! Cell value helpers shared by the transform and validation crates.

use polars::prelude::AnyValue;

/// Text form of a cell, `None` for nulls.
///
/// Floats drop trailing zeros so that `180.0` and `180` read the same.
pub fn cell_text(value: &AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(v.to_string()),
        AnyValue::Int16(v) => Some(v.to_string()),
        AnyValue::Int32(v) => Some(v.to_string()),
        AnyValue::Int64(v) => Some(v.to_string()),
        AnyValue::UInt8(v) => Some(v.to_string()),
        AnyValue::UInt16(v) => Some(v.to_string()),
        AnyValue::UInt32(v) => Some(v.to_string()),
        AnyValue::UInt64(v) => Some(v.to_string()),
        AnyValue::Float32(v) => Some(format_numeric(f64::from(*v))),
        AnyValue::Float64(v) => Some(format_numeric(*v)),
        AnyValue::String(s) => Some((*s).to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Boolean(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Formats a float without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_have_no_text() {
        assert_eq!(cell_text(&AnyValue::Null), None);
    }

    #[test]
    fn floats_lose_trailing_zeros() {
        assert_eq!(cell_text(&AnyValue::Float64(180.0)), Some("180".to_string()));
        assert_eq!(cell_text(&AnyValue::Float64(72.50)), Some("72.5".to_string()));
        assert_eq!(format_numeric(100.0), "100");
    }

    #[test]
    fn strings_pass_through() {
        assert_eq!(
            cell_text(&AnyValue::String("Arsenal")),
            Some("Arsenal".to_string())
        );
    }
}
