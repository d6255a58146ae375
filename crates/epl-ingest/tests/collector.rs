//! Collection loop tests against in-process fakes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use epl_ingest::{
    ArchiveError, CollectError, Collector, FetchError, FetchRequest, ObjectStoreArchive,
    PayloadArchive, RecordSource, RequestPacer,
};
use epl_model::{TEAM_ID_COLUMN, player_archive_key};
use object_store::ObjectStore;
use object_store::path::Path;
use serde_json::{Value, json};
use tokio::time::Instant;

/// Answers by parent key. Unknown parents fail with a 404.
#[derive(Default)]
struct FakeSource {
    responses: HashMap<Option<String>, Vec<Value>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeSource {
    fn with(mut self, parent: Option<&str>, records: Vec<Value>) -> Self {
        self.responses.insert(parent.map(str::to_string), records);
        self
    }

    fn requested_parents(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.parent.clone())
            .collect()
    }
}

impl RecordSource for FakeSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .get(&request.parent)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                body: "not found".to_string(),
            })
    }
}

/// Records every upload, optionally failing for one key.
#[derive(Default)]
struct RecordingArchive {
    uploads: Mutex<Vec<(String, Vec<Value>)>>,
    fail_key: Option<String>,
}

impl PayloadArchive for RecordingArchive {
    async fn upload_raw_payload(
        &self,
        records: &[Value],
        key: &str,
        _include_timestamp: bool,
    ) -> Result<String, ArchiveError> {
        if self.fail_key.as_deref() == Some(key) {
            return Err(ArchiveError::Store("bucket unavailable".to_string()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), records.to_vec()));
        Ok(key.to_string())
    }
}

fn players(team: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id": format!("{team}{i}"), "name": format!("Player {i}")}))
        .collect()
}

fn team_tags(report: &epl_ingest::CollectReport) -> Vec<Option<String>> {
    report
        .table
        .column(TEAM_ID_COLUMN)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_failed_key_is_skipped_and_order_kept() {
    let source = FakeSource::default()
        .with(Some("A"), players("a", 2))
        .with(Some("C"), players("c", 1));
    let archive = RecordingArchive::default();
    let mut collector = Collector::new(&source, &archive, RequestPacer::new(Duration::ZERO));

    let report = collector
        .collect_by_key("epl/v1/teams", &["A", "B", "C"], TEAM_ID_COLUMN, |key| {
            player_archive_key(key)
        })
        .await
        .unwrap();

    assert_eq!(report.rows(), 3);
    assert_eq!(
        team_tags(&report),
        vec![Some("A".into()), Some("A".into()), Some("C".into())]
    );
    assert_eq!(report.succeeded, vec!["A", "C"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].key, "B");
    assert!(matches!(
        report.skipped[0].reason,
        CollectError::Fetch(FetchError::Status { status: 404, .. })
    ));

    let uploads = archive.uploads.lock().unwrap();
    let keys: Vec<&str> = uploads.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "raw/json/epl/players/A_players.json",
            "raw/json/epl/players/C_players.json"
        ]
    );
    assert!(
        uploads[0].1.iter().all(|record| record.get(TEAM_ID_COLUMN).is_none()),
        "archived payload should be the raw records"
    );
    assert_eq!(
        source.requested_parents(),
        vec![Some("A".into()), Some("B".into()), Some("C".into())]
    );
}

#[tokio::test]
async fn test_no_keys_yields_empty_table() {
    let source = FakeSource::default();
    let archive = RecordingArchive::default();
    let mut collector = Collector::new(&source, &archive, RequestPacer::new(Duration::ZERO));

    let keys: [i64; 0] = [];
    let report = collector
        .collect_by_key("epl/v1/teams", &keys, TEAM_ID_COLUMN, |key| {
            player_archive_key(key)
        })
        .await
        .unwrap();

    assert_eq!(report.rows(), 0);
    assert_eq!(report.table.width(), 0);
    assert!(report.succeeded.is_empty());
    assert!(source.requested_parents().is_empty());
}

#[tokio::test]
async fn test_all_keys_failing_yields_empty_table() {
    let source = FakeSource::default().with(Some("2"), Vec::new());
    let archive = RecordingArchive::default();
    let mut collector = Collector::new(&source, &archive, RequestPacer::new(Duration::ZERO));

    let report = collector
        .collect_by_key("epl/v1/teams", &[1, 2], TEAM_ID_COLUMN, |key| {
            player_archive_key(key)
        })
        .await
        .unwrap();

    assert_eq!(report.rows(), 0);
    assert_eq!(report.skipped.len(), 2);
    assert!(matches!(report.skipped[1].reason, CollectError::Empty));
    assert!(archive.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_archive_failure_skips_key() {
    let source = FakeSource::default()
        .with(Some("1"), players("x", 1))
        .with(Some("2"), players("y", 2));
    let archive = RecordingArchive {
        fail_key: Some(player_archive_key(1)),
        ..RecordingArchive::default()
    };
    let mut collector = Collector::new(&source, &archive, RequestPacer::new(Duration::ZERO));

    let report = collector
        .collect_by_key("epl/v1/teams", &[1, 2], TEAM_ID_COLUMN, |key| {
            player_archive_key(key)
        })
        .await
        .unwrap();

    assert_eq!(report.rows(), 2);
    assert_eq!(report.succeeded, vec!["2"]);
    assert!(matches!(report.skipped[0].reason, CollectError::Archive(_)));
    let tags = report.table.column(TEAM_ID_COLUMN).unwrap().i64().unwrap();
    assert_eq!(tags.get(0), Some(2));
}

#[tokio::test]
async fn test_union_schema_across_keys() {
    let source = FakeSource::default()
        .with(Some("1"), vec![json!({"id": 10, "name": "Saka"})])
        .with(Some("2"), vec![json!({"id": 20, "height": "185 cm"})]);
    let archive = RecordingArchive::default();
    let mut collector = Collector::new(&source, &archive, RequestPacer::new(Duration::ZERO));

    let report = collector
        .collect_by_key("epl/v1/teams", &[1, 2], TEAM_ID_COLUMN, |key| {
            player_archive_key(key)
        })
        .await
        .unwrap();

    let names: Vec<&str> = report
        .table
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    assert_eq!(names, vec!["id", "name", "team_id", "height"]);
    assert_eq!(report.table.column("height").unwrap().null_count(), 1);
}

#[tokio::test]
async fn test_root_collection_archives_payload() {
    let source = FakeSource::default().with(None, vec![json!({"id": 1, "name": "Arsenal"})]);
    let archive = ObjectStoreArchive::in_memory();
    let mut collector = Collector::new(&source, &archive, RequestPacer::new(Duration::ZERO));

    let report = collector
        .collect_root("epl/v1/teams", "raw/json/teams/2024_teams.json")
        .await
        .unwrap();

    assert_eq!(report.rows(), 1);
    assert!(report.skipped.is_empty());
    let stored = archive
        .store()
        .get(&Path::from("raw/json/teams/2024_teams.json"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let records: Vec<Value> = serde_json::from_slice(&stored).unwrap();
    assert_eq!(records, vec![json!({"id": 1, "name": "Arsenal"})]);
}

#[tokio::test]
async fn test_root_failure_is_reported_not_raised() {
    let source = FakeSource::default();
    let archive = RecordingArchive::default();
    let mut collector = Collector::new(&source, &archive, RequestPacer::new(Duration::ZERO));

    let report = collector
        .collect_root("epl/v1/teams", "raw/json/teams/2024_teams.json")
        .await
        .unwrap();

    assert_eq!(report.rows(), 0);
    assert_eq!(report.skipped[0].key, "epl/v1/teams");
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_paced_including_failures() {
    let source = FakeSource::default()
        .with(Some("1"), players("a", 1))
        .with(Some("3"), players("c", 1));
    let archive = RecordingArchive::default();
    let mut collector =
        Collector::new(&source, &archive, RequestPacer::new(Duration::from_secs(12)));

    let start = Instant::now();
    let report = collector
        .collect_by_key("epl/v1/teams", &[1, 2, 3], TEAM_ID_COLUMN, |key| {
            player_archive_key(key)
        })
        .await
        .unwrap();

    assert_eq!(report.succeeded, vec!["1", "3"]);
    assert!(start.elapsed() >= Duration::from_secs(24));
    assert!(start.elapsed() < Duration::from_secs(36));
}
