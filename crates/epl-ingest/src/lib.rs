//! Ingestion for the EPL pipeline.
//!
//! - **client**: the HTTP fetch collaborator ([`ApiClient`]) behind [`RecordSource`]
//! - **normalize**: flattening JSON records into a table
//! - **pacer**: the minimum interval between upstream requests
//! - **archive**: write-once raw payload storage behind [`PayloadArchive`]
//! - **collector**: the fetch → tag → archive → accumulate loop

pub mod archive;
pub mod client;
pub mod collector;
pub mod error;
pub mod normalize;
pub mod pacer;

pub use archive::{ObjectStoreArchive, PayloadArchive, S3Settings};
pub use client::{ApiClient, ApiConfig, FetchRequest, RecordSource};
pub use collector::{CollectReport, Collector, SkippedKey};
pub use error::{ArchiveError, CollectError, FetchError, IngestError};
pub use normalize::records_to_frame;
pub use pacer::RequestPacer;
