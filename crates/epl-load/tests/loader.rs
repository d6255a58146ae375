use std::sync::Mutex;

use epl_load::{BulkLoader, CopySink, LoadError};
use epl_model::{TEAMS_DESTINATION, TableRef};
use polars::df;
use polars::prelude::DataFrame;

#[derive(Default)]
struct FakeSink {
    calls: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl CopySink for FakeSink {
    async fn copy_csv(&self, destination: &TableRef, csv: Vec<u8>) -> Result<u64, LoadError> {
        if self.fail {
            return Err(LoadError::Transport("connection reset".to_string()));
        }
        let text = String::from_utf8(csv).unwrap();
        let rows = text.lines().count() as u64;
        self.calls
            .lock()
            .unwrap()
            .push((destination.to_string(), text));
        Ok(rows)
    }
}

fn destination() -> TableRef {
    TEAMS_DESTINATION.parse().unwrap()
}

#[tokio::test]
async fn test_zero_row_table_never_reaches_sink() {
    let loader = BulkLoader::new(FakeSink::default());
    let empty = df! { "id" => Vec::<i64>::new() }.unwrap();

    let result = loader.commit(&empty, &destination()).await;

    assert!(matches!(result, Err(LoadError::EmptyInput)));
    assert!(loader.sink().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_column_table_never_reaches_sink() {
    let loader = BulkLoader::new(FakeSink::default());

    let result = loader.commit(&DataFrame::empty(), &destination()).await;

    assert!(matches!(result, Err(LoadError::EmptyInput)));
    assert!(loader.sink().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_commit_sends_headerless_csv() {
    let loader = BulkLoader::new(FakeSink::default());
    let teams = df! {
        "id" => [1i64, 2],
        "name" => ["Arsenal", "Chelsea"],
    }
    .unwrap();

    let rows = loader.commit(&teams, &destination()).await.unwrap();

    assert_eq!(rows, 2);
    let calls = loader.sink().calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "epl_datapipeline.epl_teams");
    assert_eq!(calls[0].1, "1,Arsenal\n2,Chelsea\n");
}

#[tokio::test]
async fn test_transport_failure_is_returned() {
    let loader = BulkLoader::new(FakeSink {
        fail: true,
        ..FakeSink::default()
    });
    let teams = df! { "id" => [1i64] }.unwrap();

    let result = loader.commit(&teams, &destination()).await;

    assert!(matches!(result, Err(LoadError::Transport(_))));
}
