//! Write-once archive of raw API payloads.
//!
//! Every successful fetch is stored verbatim as a JSON array so that a run can
//! be audited or replayed from the bucket. The pipeline never reads these
//! objects back.

use std::sync::Arc;

use chrono::Local;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ArchiveError;

/// Timestamp prefix format for time-stamped keys.
const RUN_STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Destination for raw payloads.
#[allow(async_fn_in_trait)]
pub trait PayloadArchive {
    /// Store `records` under `key` and return the key actually written.
    ///
    /// With `include_timestamp` the key is prefixed with the run stamp.
    async fn upload_raw_payload(
        &self,
        records: &[Value],
        key: &str,
        include_timestamp: bool,
    ) -> Result<String, ArchiveError>;
}

/// S3 connection settings.
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub bucket: String,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// [`PayloadArchive`] backed by any `object_store` implementation.
#[derive(Debug, Clone)]
pub struct ObjectStoreArchive {
    store: Arc<dyn ObjectStore>,
    location: String,
    run_stamp: String,
}

impl ObjectStoreArchive {
    /// Wrap an existing store. `location` is only used in log output.
    pub fn new(store: Arc<dyn ObjectStore>, location: impl Into<String>) -> Self {
        Self {
            store,
            location: location.into(),
            run_stamp: Local::now().format(RUN_STAMP_FORMAT).to_string(),
        }
    }

    /// Archive writing to an S3 bucket.
    pub fn s3(settings: &S3Settings) -> Result<Self, ArchiveError> {
        if settings.bucket.trim().is_empty() {
            return Err(ArchiveError::Config("bucket name is empty".to_string()));
        }
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&settings.bucket);
        if let Some(region) = &settings.region {
            builder = builder.with_region(region);
        }
        if let Some(key_id) = &settings.access_key_id {
            builder = builder.with_access_key_id(key_id);
        }
        if let Some(secret) = &settings.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        let store = builder
            .build()
            .map_err(|e| ArchiveError::Config(format!("failed to build S3 client: {e}")))?;
        Ok(Self::new(Arc::new(store), format!("s3://{}", settings.bucket)))
    }

    /// Archive that keeps everything in memory, for dry runs and tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory")
    }

    /// Replace the run stamp used for time-stamped keys.
    #[must_use]
    pub fn with_run_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.run_stamp = stamp.into();
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Key an upload ends up under.
    pub fn storage_key(&self, key: &str, include_timestamp: bool) -> String {
        if include_timestamp {
            format!("{}_{key}", self.run_stamp)
        } else {
            key.to_string()
        }
    }
}

impl PayloadArchive for ObjectStoreArchive {
    async fn upload_raw_payload(
        &self,
        records: &[Value],
        key: &str,
        include_timestamp: bool,
    ) -> Result<String, ArchiveError> {
        let key = self.storage_key(key, include_timestamp);
        let body = serde_json::to_vec(records)?;
        let bytes = body.len();
        let path = Path::parse(&key)
            .map_err(|e| ArchiveError::Config(format!("invalid storage key {key:?}: {e}")))?;
        if let Err(error) = self.store.put(&path, PutPayload::from(body)).await {
            warn!(location = %self.location, %key, %error, "raw payload upload failed");
            return Err(error.into());
        }
        info!(location = %self.location, %key, bytes, records = records.len(), "raw payload archived");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_storage_key_with_and_without_stamp() {
        let archive = ObjectStoreArchive::in_memory().with_run_stamp("2024-08-01T10:00:00");
        assert_eq!(
            archive.storage_key("raw/json/teams/2024_teams.json", false),
            "raw/json/teams/2024_teams.json"
        );
        assert_eq!(
            archive.storage_key("raw/json/teams/2024_teams.json", true),
            "2024-08-01T10:00:00_raw/json/teams/2024_teams.json"
        );
    }

    #[test]
    fn test_s3_requires_bucket() {
        let err = ObjectStoreArchive::s3(&S3Settings::default()).unwrap_err();
        assert!(matches!(err, ArchiveError::Config(_)));
    }

    #[tokio::test]
    async fn test_upload_writes_json_array() {
        let archive = ObjectStoreArchive::in_memory();
        let records = vec![json!({"id": 1, "name": "Arsenal"})];

        let key = archive
            .upload_raw_payload(&records, "raw/json/teams/2024_teams.json", false)
            .await
            .unwrap();

        let stored = archive
            .store()
            .get(&Path::from(key.as_str()))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        let round: Vec<Value> = serde_json::from_slice(&stored).unwrap();
        assert_eq!(round, records);
    }
}
