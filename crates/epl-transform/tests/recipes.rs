//! Tests for the team and player cleaning chains.

use epl_model::PLAYER_COLUMNS;
use epl_transform::{TransformError, clean_players, clean_teams};
use polars::df;
use polars::prelude::*;

fn raw_players() -> DataFrame {
    df!(
        "ID" => [10i64, 11, 12],
        "Position" => ["Forward", "Midfielder", "Defender"],
        "National_Team" => ["England", "England", "France"],
        "Height" => ["178", "185", "190"],
        "Weight" => ["72", "80", "tall"],
        "Birth_Date" => [Some("2001-09-05"), Some("1999-01-14"), None],
        "Age" => [23i64, 25, 28],
        "Name" => ["Bukayo Saka", "Declan Rice", "William Saliba"],
        "First_Name" => ["Bukayo", "Declan", "William"],
        "Last_Name" => ["Saka", "Rice", "Saliba"],
        "Shirt" => [7i64, 41, 2],
        "team_id" => [1i64, 1, 1],
    )
    .unwrap()
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[test]
fn test_clean_players_projects_output_schema() {
    let cleaned = clean_players(raw_players()).unwrap();

    assert_eq!(column_names(&cleaned), PLAYER_COLUMNS.to_vec());
    // Saliba has no birth date and is dropped before the casts run.
    assert_eq!(cleaned.height(), 2);
}

#[test]
fn test_clean_players_casts_measurements() {
    let cleaned = clean_players(raw_players()).unwrap();

    assert_eq!(cleaned.column("height").unwrap().dtype(), &DataType::Int64);
    // Only complete rows remain, so weight is castable too.
    assert_eq!(cleaned.column("weight").unwrap().dtype(), &DataType::Int64);
}

#[test]
fn test_clean_players_leaves_uncastable_column_alone() {
    let mut raw = raw_players();
    raw.with_column(Series::new(
        "Birth_Date".into(),
        ["2001-09-05", "1999-01-14", "2001-03-24"],
    ))
    .unwrap();

    let cleaned = clean_players(raw).unwrap();

    assert_eq!(cleaned.height(), 3);
    assert_eq!(cleaned.column("height").unwrap().dtype(), &DataType::Int64);
    assert_eq!(cleaned.column("weight").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_clean_players_missing_output_column_is_fatal() {
    let raw = raw_players().drop("National_Team").unwrap();

    let err = clean_players(raw).unwrap_err();

    assert!(matches!(err, TransformError::ColumnNotFound(name) if name == "national_team"));
}

#[test]
fn test_clean_players_empty_input_passes_through() {
    let empty = DataFrame::empty();
    let cleaned = clean_players(empty).unwrap();
    assert_eq!(cleaned.height(), 0);
    assert_eq!(cleaned.width(), 0);
}

#[test]
fn test_clean_teams_lowercases_and_fills() {
    let teams = df!(
        "ID" => [1i64, 2],
        "Name" => ["Arsenal", "Aston Villa"],
        "Short_Name" => ["ARS", "AVL"],
    )
    .unwrap();

    let cleaned = clean_teams(teams).unwrap();

    assert_eq!(column_names(&cleaned), vec!["id", "name", "short_name"]);
    assert_eq!(cleaned.height(), 2);
}
