//! Cleaning chains for the two tables the pipeline loads.

use epl_model::{FillValue, PLAYER_COLUMNS, ScalarType, TypeCastSpec};
use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::error::Result;
use crate::pipeline::CleaningPipeline;

/// Clean the team table: drop incomplete rows, lowercase names, fill gaps.
///
/// An empty table is returned unchanged.
pub fn clean_teams(teams: DataFrame) -> Result<DataFrame> {
    if teams.height() == 0 {
        warn!("team table is empty, skipping cleaning");
        return Ok(teams);
    }
    info!(rows = teams.height(), "cleaning teams");
    let cleaned = CleaningPipeline::new(teams)
        .drop_incomplete_rows()?
        .lowercase_column_names()?
        .fill_missing(FillValue::empty_text())?
        .materialize();
    info!(rows = cleaned.height(), "team cleaning complete");
    Ok(cleaned)
}

/// Cast applied to player measurements.
pub fn player_cast_spec() -> TypeCastSpec {
    TypeCastSpec::new()
        .with("height", ScalarType::Integer)
        .with("weight", ScalarType::Integer)
}

/// Clean the player table and project it onto [`PLAYER_COLUMNS`].
///
/// An empty table is returned unchanged. A non-empty table missing any of the
/// output columns is an error.
pub fn clean_players(players: DataFrame) -> Result<DataFrame> {
    if players.height() == 0 {
        warn!("player table is empty, skipping cleaning");
        return Ok(players);
    }
    info!(rows = players.height(), "cleaning players");
    let cleaned = CleaningPipeline::new(players)
        .drop_incomplete_rows()?
        .lowercase_column_names()?
        .cast_column_types(&player_cast_spec())?
        .fill_missing(FillValue::empty_text())?
        .select_columns(PLAYER_COLUMNS)?
        .materialize();
    info!(rows = cleaned.height(), "player cleaning complete");
    Ok(cleaned)
}
