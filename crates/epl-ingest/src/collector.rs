//! Paced fetch-and-accumulate loop.
//!
//! The collector walks a list of parent keys strictly in order. For each key it
//! waits on the shared [`RequestPacer`], fetches the dependent records, tags a
//! copy of every record with the key, and archives the raw payload. A failure
//! at any of those steps skips that key only. After the loop the tagged records
//! are normalized into one table, so rows keep key order and every row carries
//! the union of columns seen across keys.

use std::fmt::Display;
use std::time::Instant;

use polars::prelude::DataFrame;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::archive::PayloadArchive;
use crate::client::{FetchRequest, RecordSource};
use crate::error::{CollectError, IngestError};
use crate::normalize::records_to_frame;
use crate::pacer::RequestPacer;

/// A key that produced no rows, and why.
#[derive(Debug)]
pub struct SkippedKey {
    pub key: String,
    pub reason: CollectError,
}

/// Outcome of one collection run.
#[derive(Debug)]
pub struct CollectReport {
    /// Combined table; empty with no columns when nothing succeeded.
    pub table: DataFrame,
    /// Keys whose records made it into the table, in order.
    pub succeeded: Vec<String>,
    pub skipped: Vec<SkippedKey>,
}

impl CollectReport {
    fn from_records(
        records: &[Value],
        succeeded: Vec<String>,
        skipped: Vec<SkippedKey>,
    ) -> Result<Self, IngestError> {
        let table = if records.is_empty() {
            DataFrame::empty()
        } else {
            records_to_frame(records)?
        };
        Ok(Self {
            table,
            succeeded,
            skipped,
        })
    }

    pub fn rows(&self) -> usize {
        self.table.height()
    }
}

/// Drives a [`RecordSource`] and a [`PayloadArchive`] under one pacer.
pub struct Collector<'a, S, A> {
    source: &'a S,
    archive: &'a A,
    pacer: RequestPacer,
    timestamp_keys: bool,
}

impl<'a, S, A> Collector<'a, S, A>
where
    S: RecordSource,
    A: PayloadArchive,
{
    pub fn new(source: &'a S, archive: &'a A, pacer: RequestPacer) -> Self {
        Self {
            source,
            archive,
            pacer,
            timestamp_keys: false,
        }
    }

    /// Prefix archive keys with the archive's run stamp.
    #[must_use]
    pub fn with_timestamped_keys(mut self, enabled: bool) -> Self {
        self.timestamp_keys = enabled;
        self
    }

    /// Fetch one top-level collection and archive it under `storage_key`.
    pub async fn collect_root(
        &mut self,
        endpoint: &str,
        storage_key: &str,
    ) -> Result<CollectReport, IngestError> {
        let request = FetchRequest::root(endpoint);
        let outcome = match self.fetch(&request).await {
            Ok(records) => self
                .store_payload(&records, storage_key)
                .await
                .map(|()| records),
            Err(reason) => Err(reason),
        };
        match outcome {
            Ok(records) => {
                info!(%endpoint, records = records.len(), "collection finished");
                CollectReport::from_records(&records, vec![endpoint.to_string()], Vec::new())
            }
            Err(reason) => {
                warn!(%endpoint, %reason, "collection produced no records");
                let skipped = vec![SkippedKey {
                    key: endpoint.to_string(),
                    reason,
                }];
                CollectReport::from_records(&[], Vec::new(), skipped)
            }
        }
    }

    /// Fetch the records owned by each key in `keys`.
    ///
    /// Every record is tagged with `tag_column` set to its key. The untagged
    /// payload is archived under `storage_key(key)`.
    pub async fn collect_by_key<K, F>(
        &mut self,
        endpoint: &str,
        keys: &[K],
        tag_column: &str,
        storage_key: F,
    ) -> Result<CollectReport, IngestError>
    where
        K: Display + Serialize,
        F: Fn(&K) -> String,
    {
        let started = Instant::now();
        let mut records = Vec::new();
        let mut succeeded = Vec::new();
        let mut skipped = Vec::new();

        for key in keys {
            let request = FetchRequest::scoped(endpoint, key);
            let outcome = match self.fetch(&request).await {
                Ok(fetched) => match tag_records(&fetched, tag_column, key) {
                    Ok(tagged) => self
                        .store_payload(&fetched, &storage_key(key))
                        .await
                        .map(|()| tagged),
                    Err(reason) => Err(reason),
                },
                Err(reason) => Err(reason),
            };
            match outcome {
                Ok(tagged) => {
                    debug!(%tag_column, key = %key, records = tagged.len(), "key collected");
                    records.extend(tagged);
                    succeeded.push(key.to_string());
                }
                Err(reason) => {
                    warn!(%tag_column, key = %key, %reason, "skipping key");
                    skipped.push(SkippedKey {
                        key: key.to_string(),
                        reason,
                    });
                }
            }
        }

        info!(
            %endpoint,
            succeeded = succeeded.len(),
            skipped = skipped.len(),
            records = records.len(),
            duration_ms = started.elapsed().as_millis(),
            "collection finished"
        );
        CollectReport::from_records(&records, succeeded, skipped)
    }

    async fn fetch(&mut self, request: &FetchRequest) -> Result<Vec<Value>, CollectError> {
        self.pacer.wait().await;
        let records = self.source.fetch(request).await?;
        if records.is_empty() {
            return Err(CollectError::Empty);
        }
        Ok(records)
    }

    async fn store_payload(&self, records: &[Value], storage_key: &str) -> Result<(), CollectError> {
        self.archive
            .upload_raw_payload(records, storage_key, self.timestamp_keys)
            .await?;
        Ok(())
    }
}

/// Copies of `records` with `column` set to `key`.
fn tag_records<K>(records: &[Value], column: &str, key: &K) -> Result<Vec<Value>, CollectError>
where
    K: Display + Serialize,
{
    let tag = serde_json::to_value(key).unwrap_or_else(|_| Value::String(key.to_string()));
    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(map) => {
                let mut map = map.clone();
                map.insert(column.to_string(), tag.clone());
                Ok(Value::Object(map))
            }
            _ => Err(CollectError::NotAnObject { index }),
        })
        .collect()
}
