//! Integer token extraction.

use std::sync::LazyLock;

use regex::Regex;

static INTEGER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("integer token pattern is valid"));

/// Returns the first integer-looking token in `value`.
///
/// `"180 cm"` yields `180`, `"approx. 75kg"` yields `75`. Values with no digits,
/// or whose token overflows `i64`, yield `None`.
pub fn leading_integer(value: &str) -> Option<i64> {
    INTEGER_TOKEN
        .find(value)
        .and_then(|token| token.as_str().parse::<i64>().ok())
}
