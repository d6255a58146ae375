//! Table to CSV to sink.

use std::time::Instant;

use epl_model::TableRef;
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::{info, warn};

use crate::error::LoadError;

/// Receives headerless CSV destined for one table.
///
/// Implementations either load every row or none of them, and return the
/// number of rows written.
#[allow(async_fn_in_trait)]
pub trait CopySink {
    async fn copy_csv(&self, destination: &TableRef, csv: Vec<u8>) -> Result<u64, LoadError>;
}

/// Encode `df` as CSV without a header row, columns in frame order.
///
/// Nulls become empty fields, which `COPY ... (FORMAT csv)` reads as NULL.
pub fn encode_csv(df: &DataFrame) -> Result<Vec<u8>, LoadError> {
    let mut buf = Vec::new();
    let mut frame = df.clone();
    CsvWriter::new(&mut buf)
        .include_header(false)
        .finish(&mut frame)?;
    Ok(buf)
}

#[derive(Debug, Clone)]
pub struct BulkLoader<S> {
    sink: S,
}

impl<S: CopySink> BulkLoader<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Load every row of `df` into `destination`.
    ///
    /// An empty table is refused with [`LoadError::EmptyInput`] before the sink
    /// is touched.
    pub async fn commit(&self, df: &DataFrame, destination: &TableRef) -> Result<u64, LoadError> {
        if df.height() == 0 || df.width() == 0 {
            warn!(%destination, "skipping load of empty table");
            return Err(LoadError::EmptyInput);
        }

        let started = Instant::now();
        let csv = encode_csv(df)?;
        match self.sink.copy_csv(destination, csv).await {
            Ok(rows) => {
                info!(
                    %destination,
                    rows,
                    duration_ms = started.elapsed().as_millis(),
                    "bulk load committed"
                );
                Ok(rows)
            }
            Err(error) => {
                warn!(%destination, %error, "bulk load failed");
                Err(error)
            }
        }
    }
}
