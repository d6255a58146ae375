//! Run orchestration with explicit stages.
//!
//! 1. **Teams**: collect the season's teams, clean, check, load
//! 2. **Players**: collect each cleaned team's roster, clean, check, load
//!
//! One [`RequestPacer`] spans both stages, so the gap between the team request
//! and the first roster request is paced like any other. A stage only fails the
//! run on a schema error; fetch, archive and load failures are recorded in its
//! [`StageSummary`].

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use anyhow::{Context, Result};
use epl_ingest::{CollectReport, Collector, PayloadArchive, RecordSource, RequestPacer};
use epl_load::{BulkLoader, CopySink, LoadError};
use epl_model::{
    DEFAULT_SCHEMA, PLAYER_COLUMNS, PLAYERS_TABLE, ScalarType, TEAM_ID_COLUMN, TEAMS_ENDPOINT,
    TEAMS_TABLE, TableRef, player_archive_key, team_archive_key,
};
use epl_transform::{clean_players, clean_teams};
use epl_validate::{QualityChecker, QualityReport};
use polars::prelude::{DataFrame, DataType};
use tracing::{Instrument, info, info_span, warn};

use crate::types::{LoadOutcome, StageSummary};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub season: u16,
    /// Minimum gap between upstream requests.
    pub request_interval: Duration,
    /// Prefix archive keys with the run stamp.
    pub timestamp_keys: bool,
    /// Stop after the team stage.
    pub skip_players: bool,
    pub teams_destination: TableRef,
    pub players_destination: TableRef,
}

impl PipelineOptions {
    /// Options loading into `schema` with the default request interval.
    pub fn new(season: u16, schema: &str) -> Result<Self> {
        Ok(Self {
            season,
            request_interval: Duration::from_secs(12),
            timestamp_keys: false,
            skip_players: false,
            teams_destination: TableRef::new(Some(schema), TEAMS_TABLE)
                .context("invalid teams destination")?,
            players_destination: TableRef::new(Some(schema), PLAYERS_TABLE)
                .context("invalid players destination")?,
        })
    }

    pub fn for_season(season: u16) -> Result<Self> {
        Self::new(season, DEFAULT_SCHEMA)
    }
}

/// Run every stage. `loader` is `None` on a dry run.
pub async fn run_pipeline<S, A, C>(
    source: &S,
    archive: &A,
    loader: Option<&BulkLoader<C>>,
    options: &PipelineOptions,
) -> Result<Vec<StageSummary>>
where
    S: RecordSource,
    A: PayloadArchive,
    C: CopySink,
{
    let pacer = RequestPacer::new(options.request_interval);
    let mut collector =
        Collector::new(source, archive, pacer).with_timestamped_keys(options.timestamp_keys);

    let (teams_summary, teams) = team_stage(&mut collector, loader, options)
        .instrument(info_span!("stage", name = "teams"))
        .await?;
    let mut stages = vec![teams_summary];

    if options.skip_players {
        info!("player stage skipped");
        return Ok(stages);
    }

    let ids = team_ids(&teams)?;
    let players_summary = player_stage(&mut collector, &ids, loader, options)
        .instrument(info_span!("stage", name = "players", teams = ids.len()))
        .await?;
    stages.push(players_summary);
    Ok(stages)
}

async fn team_stage<S, A, C>(
    collector: &mut Collector<'_, S, A>,
    loader: Option<&BulkLoader<C>>,
    options: &PipelineOptions,
) -> Result<(StageSummary, DataFrame)>
where
    S: RecordSource,
    A: PayloadArchive,
    C: CopySink,
{
    info!(season = options.season, "teams ingestion starting");
    let report = collector
        .collect_root(TEAMS_ENDPOINT, &team_archive_key(options.season))
        .await
        .context("collect teams")?;
    let fetched_rows = report.rows();
    let skipped = skipped_reasons(&report);

    let cleaned = clean_teams(report.table).context("clean teams")?;
    let quality = check_quality(&cleaned, None, &team_expected_types());
    let load = load_table(loader, &cleaned, &options.teams_destination).await;

    let summary = StageSummary {
        name: "teams",
        destination: options.teams_destination.clone(),
        fetched_rows,
        cleaned_rows: cleaned.height(),
        skipped,
        load,
        quality,
    };
    Ok((summary, cleaned))
}

async fn player_stage<S, A, C>(
    collector: &mut Collector<'_, S, A>,
    team_ids: &[i64],
    loader: Option<&BulkLoader<C>>,
    options: &PipelineOptions,
) -> Result<StageSummary>
where
    S: RecordSource,
    A: PayloadArchive,
    C: CopySink,
{
    info!(teams = team_ids.len(), "players ingestion starting");
    let report = collector
        .collect_by_key(TEAMS_ENDPOINT, team_ids, TEAM_ID_COLUMN, |id| {
            player_archive_key(id)
        })
        .await
        .context("collect players")?;
    if report.succeeded.is_empty() {
        warn!("no player data was fetched for any team");
    }
    let fetched_rows = report.rows();
    let skipped = skipped_reasons(&report);

    let cleaned = clean_players(report.table).context("clean players")?;
    let quality = check_quality(&cleaned, Some(&PLAYER_COLUMNS[..]), &player_expected_types());
    let load = load_table(loader, &cleaned, &options.players_destination).await;

    Ok(StageSummary {
        name: "players",
        destination: options.players_destination.clone(),
        fetched_rows,
        cleaned_rows: cleaned.height(),
        skipped,
        load,
        quality,
    })
}

/// Distinct team ids from the cleaned team table, in table order.
///
/// An empty table has no ids. Ids that are not integers are skipped with a
/// warning.
pub fn team_ids(teams: &DataFrame) -> Result<Vec<i64>> {
    if teams.height() == 0 {
        return Ok(Vec::new());
    }
    let column = teams
        .column("id")
        .context("cleaned team table has no id column")?
        .cast(&DataType::Int64)
        .context("cast team ids")?;
    let values = column.i64().context("read team ids")?;
    if values.null_count() > 0 {
        warn!(
            invalid = values.null_count(),
            "ignoring team ids that are not integers"
        );
    }
    let mut seen = HashSet::new();
    Ok(values
        .into_iter()
        .flatten()
        .filter(|id| seen.insert(*id))
        .collect())
}

pub fn team_expected_types() -> BTreeMap<String, ScalarType> {
    BTreeMap::from([
        ("id".to_string(), ScalarType::Integer),
        ("name".to_string(), ScalarType::String),
    ])
}

pub fn player_expected_types() -> BTreeMap<String, ScalarType> {
    [
        ("id", ScalarType::Integer),
        ("height", ScalarType::Integer),
        ("weight", ScalarType::Integer),
        ("age", ScalarType::Integer),
        ("name", ScalarType::String),
        (TEAM_ID_COLUMN, ScalarType::Integer),
    ]
    .into_iter()
    .map(|(name, ty)| (name.to_string(), ty))
    .collect()
}

/// Quality report for a cleaned table, or `None` when it has no rows.
pub fn check_quality(
    df: &DataFrame,
    expected_columns: Option<&[&str]>,
    expected_types: &BTreeMap<String, ScalarType>,
) -> Option<QualityReport> {
    if df.height() == 0 {
        return None;
    }
    let report = QualityChecker::new(df).report(expected_columns, Some(expected_types));
    if report.is_clean() {
        info!("quality checks passed");
    } else {
        warn!(
            findings = report.finding_count(),
            "quality checks found issues"
        );
    }
    Some(report)
}

async fn load_table<C: CopySink>(
    loader: Option<&BulkLoader<C>>,
    df: &DataFrame,
    destination: &TableRef,
) -> LoadOutcome {
    let Some(loader) = loader else {
        info!(%destination, rows = df.height(), "dry run, load skipped");
        return LoadOutcome::DryRun;
    };
    match loader.commit(df, destination).await {
        Ok(rows) => LoadOutcome::Loaded(rows),
        Err(LoadError::EmptyInput) => LoadOutcome::Empty,
        Err(error) => LoadOutcome::Failed(error.to_string()),
    }
}

fn skipped_reasons(report: &CollectReport) -> Vec<(String, String)> {
    report
        .skipped
        .iter()
        .map(|skip| (skip.key.clone(), skip.reason.to_string()))
        .collect()
}
