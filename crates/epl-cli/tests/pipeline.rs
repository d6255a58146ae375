//! Integration tests for run orchestration, with in-process fakes for the API
//! and the database.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use epl_cli::pipeline::{PipelineOptions, check_quality, run_pipeline, team_ids};
use epl_cli::types::LoadOutcome;
use epl_ingest::{FetchError, FetchRequest, ObjectStoreArchive, RecordSource};
use epl_load::{BulkLoader, CopySink, LoadError};
use epl_model::{PLAYER_COLUMNS, TableRef};
use object_store::ObjectStore;
use object_store::path::Path;
use polars::df;
use serde_json::{Value, json};
use tokio::time::Instant;

#[derive(Default)]
struct FakeApi {
    teams: Vec<Value>,
    rosters: HashMap<String, Vec<Value>>,
    requests: Mutex<Vec<(Option<String>, Instant)>>,
}

impl RecordSource for FakeApi {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.parent.clone(), Instant::now()));
        match &request.parent {
            None => Ok(self.teams.clone()),
            Some(team) => self.rosters.get(team).cloned().ok_or(FetchError::Status {
                status: 500,
                body: "upstream error".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct FakeDatabase {
    copies: Mutex<Vec<(String, usize)>>,
}

impl CopySink for FakeDatabase {
    async fn copy_csv(&self, destination: &TableRef, csv: Vec<u8>) -> Result<u64, LoadError> {
        let rows = String::from_utf8(csv).unwrap().lines().count();
        self.copies
            .lock()
            .unwrap()
            .push((destination.to_string(), rows));
        Ok(rows as u64)
    }
}

fn player(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "position": "Midfielder",
        "national_team": "England",
        "height": 180,
        "weight": 75,
        "birth_date": "2000-01-01",
        "age": 24,
        "name": name,
        "first_name": name,
        "last_name": name,
        "contract_until": 2027,
    })
}

fn league() -> FakeApi {
    FakeApi {
        teams: vec![
            json!({"id": 1, "name": "Arsenal", "short_name": "ARS"}),
            json!({"id": 2, "name": "Chelsea", "short_name": "CHE"}),
            json!({"id": 3, "name": "Everton", "short_name": "EVE"}),
        ],
        rosters: HashMap::from([
            ("1".to_string(), vec![player(10, "Saka"), player(11, "Rice")]),
            ("3".to_string(), vec![player(30, "Pickford")]),
        ]),
        ..FakeApi::default()
    }
}

fn options() -> PipelineOptions {
    let mut options = PipelineOptions::for_season(2024).unwrap();
    options.request_interval = Duration::ZERO;
    options
}

#[tokio::test]
async fn test_full_run_loads_both_tables() {
    let api = league();
    let archive = ObjectStoreArchive::in_memory();
    let loader = BulkLoader::new(FakeDatabase::default());

    let stages = run_pipeline(&api, &archive, Some(&loader), &options())
        .await
        .unwrap();

    assert_eq!(stages.len(), 2);
    let teams = &stages[0];
    assert_eq!(teams.name, "teams");
    assert_eq!(teams.cleaned_rows, 3);
    assert_eq!(teams.load, LoadOutcome::Loaded(3));

    let players = &stages[1];
    assert_eq!(players.fetched_rows, 3);
    assert_eq!(players.cleaned_rows, 3);
    assert_eq!(players.load, LoadOutcome::Loaded(3));
    assert_eq!(players.skipped.len(), 1);
    assert_eq!(players.skipped[0].0, "2");
    assert!(players.quality.as_ref().unwrap().is_clean());

    let copies = loader.sink().copies.lock().unwrap();
    assert_eq!(
        *copies,
        vec![
            ("epl_datapipeline.epl_teams".to_string(), 3),
            ("epl_datapipeline.epl_team_players".to_string(), 3),
        ]
    );

    for key in [
        "raw/json/teams/2024_teams.json",
        "raw/json/epl/players/1_players.json",
        "raw/json/epl/players/3_players.json",
    ] {
        assert!(
            archive.store().head(&Path::from(key)).await.is_ok(),
            "missing archive object {key}"
        );
    }
}

#[tokio::test]
async fn test_dry_run_skips_loads() {
    let api = league();
    let archive = ObjectStoreArchive::in_memory();

    let stages = run_pipeline(
        &api,
        &archive,
        None::<&BulkLoader<FakeDatabase>>,
        &options(),
    )
    .await
    .unwrap();

    assert!(stages.iter().all(|stage| stage.load == LoadOutcome::DryRun));
    assert_eq!(stages[1].cleaned_rows, 3);
}

#[tokio::test]
async fn test_skip_players_stops_after_teams() {
    let api = league();
    let archive = ObjectStoreArchive::in_memory();
    let loader = BulkLoader::new(FakeDatabase::default());
    let mut options = options();
    options.skip_players = true;

    let stages = run_pipeline(&api, &archive, Some(&loader), &options)
        .await
        .unwrap();

    assert_eq!(stages.len(), 1);
    assert_eq!(loader.sink().copies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_no_teams_still_runs_player_stage_empty() {
    let api = FakeApi::default();
    let archive = ObjectStoreArchive::in_memory();
    let loader = BulkLoader::new(FakeDatabase::default());

    let stages = run_pipeline(&api, &archive, Some(&loader), &options())
        .await
        .unwrap();

    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0].load, LoadOutcome::Empty);
    assert_eq!(stages[1].fetched_rows, 0);
    assert_eq!(stages[1].load, LoadOutcome::Empty);
    assert!(stages[1].quality.is_none());
    assert!(loader.sink().copies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_players_missing_output_column_fail_the_run() {
    let mut api = league();
    api.rosters.insert(
        "1".to_string(),
        vec![json!({"id": 10, "name": "Saka", "height": 178, "weight": 70})],
    );
    api.rosters.remove("3");
    let archive = ObjectStoreArchive::in_memory();
    let loader = BulkLoader::new(FakeDatabase::default());

    let result = run_pipeline(&api, &archive, Some(&loader), &options()).await;

    let error = result.unwrap_err();
    assert!(format!("{error:#}").contains("clean players"));
    assert_eq!(loader.sink().copies.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_roster_requests_share_the_team_request_pacing() {
    let api = FakeApi {
        teams: vec![json!({"id": 1, "name": "Arsenal", "short_name": "ARS"})],
        rosters: HashMap::from([("1".to_string(), vec![player(10, "Saka")])]),
        ..FakeApi::default()
    };
    let archive = ObjectStoreArchive::in_memory();
    let mut options = options();
    options.request_interval = Duration::from_secs(12);

    let stages = run_pipeline(
        &api,
        &archive,
        None::<&BulkLoader<FakeDatabase>>,
        &options,
    )
    .await
    .unwrap();
    assert_eq!(stages[1].cleaned_rows, 1);

    let requests = api.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, None);
    assert_eq!(requests[1].0.as_deref(), Some("1"));
    assert!(requests[1].1 - requests[0].1 >= Duration::from_secs(12));
}

#[test]
fn test_team_ids_in_order_without_duplicates() {
    let teams = df! {
        "id" => [3i64, 1, 3, 2],
        "name" => ["Everton", "Arsenal", "Everton", "Chelsea"],
    }
    .unwrap();

    assert_eq!(team_ids(&teams).unwrap(), vec![3, 1, 2]);
}

#[test]
fn test_team_ids_from_text_column() {
    let teams = df! { "id" => ["7", "x", "9"] }.unwrap();
    assert_eq!(team_ids(&teams).unwrap(), vec![7, 9]);
}

#[test]
fn test_team_ids_require_id_column_when_rows_exist() {
    let teams = df! { "name" => ["Arsenal"] }.unwrap();
    assert!(team_ids(&teams).is_err());

    let empty = df! { "name" => Vec::<String>::new() }.unwrap();
    assert!(team_ids(&empty).unwrap().is_empty());
}

#[test]
fn test_quality_reports_schema_drift() {
    let players = df! {
        "id" => [1i64],
        "name" => ["Saka"],
    }
    .unwrap();

    let report = check_quality(
        &players,
        Some(&PLAYER_COLUMNS[..]),
        &epl_cli::pipeline::player_expected_types(),
    )
    .unwrap();

    assert!(!report.is_clean());
    assert!(report.types.is_none());
}
