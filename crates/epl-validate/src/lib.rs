//! Data quality diagnostics.
//!
//! [`QualityChecker`] never mutates the table it inspects and never fails: a
//! diagnostic that cannot be computed logs a warning and reports `None`.

mod checker;
mod report;

pub use checker::QualityChecker;
pub use report::{QualityReport, SchemaDiff, TypeDiff, TypeMismatch};
