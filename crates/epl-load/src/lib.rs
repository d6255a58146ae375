//! Bulk loading for the EPL pipeline.
//!
//! [`BulkLoader`] turns a cleaned table into headerless CSV and hands it to a
//! [`CopySink`]. The production sink, [`PgCopySink`], streams it through
//! Postgres `COPY ... FROM STDIN` inside a single transaction.

pub mod error;
pub mod loader;
pub mod postgres;

pub use error::LoadError;
pub use loader::{BulkLoader, CopySink, encode_csv};
pub use postgres::{PgCopySink, PgSettings};
