use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use epl_ingest::{ApiClient, ObjectStoreArchive};
use epl_load::{BulkLoader, PgCopySink};
use epl_model::{PLAYER_COLUMNS, TEAM_ID_COLUMN, TEAMS_ENDPOINT};
use tracing::{Instrument, info, info_span};

use epl_cli::pipeline::{PipelineOptions, player_expected_types, run_pipeline};
use epl_cli::types::RunResult;

use crate::cli::RunArgs;
use crate::summary::apply_table_style;

/// Print where each table lands and the player columns in load order.
pub fn run_schema() -> Result<()> {
    let options = PipelineOptions::for_season(2024)?;
    println!("Teams: {}", options.teams_destination);
    println!("Players: {}", options.players_destination);

    let expected = player_expected_types();
    let mut table = Table::new();
    table.set_header(vec!["#", "Column", "Expected type"]);
    apply_table_style(&mut table);
    for (position, column) in PLAYER_COLUMNS.iter().enumerate() {
        let expected_type = expected
            .get(*column)
            .map_or_else(|| "-".to_string(), ToString::to_string);
        table.add_row(vec![(position + 1).to_string(), (*column).to_string(), expected_type]);
    }
    println!("{table}");
    println!("Rosters: {TEAMS_ENDPOINT}/{{{TEAM_ID_COLUMN}}}/players");
    Ok(())
}

/// Run the pipeline against the configured API, bucket and database.
pub async fn run_etl(args: &RunArgs) -> Result<RunResult> {
    let started = Instant::now();
    let options = args.pipeline_options()?;
    let client = ApiClient::new(&args.api_config()).context("create API client")?;
    let archive = if args.dry_run {
        ObjectStoreArchive::in_memory()
    } else {
        ObjectStoreArchive::s3(&args.s3_settings()).context("configure raw archive")?
    };

    let sink = if args.dry_run {
        None
    } else {
        Some(
            PgCopySink::connect(&args.pg_settings())
                .await
                .context("connect to database")?,
        )
    };
    let loader = sink.clone().map(BulkLoader::new);

    let outcome = run_pipeline(&client, &archive, loader.as_ref(), &options)
        .instrument(info_span!("run", season = args.season, dry_run = args.dry_run))
        .await;

    if let Some(sink) = &sink {
        sink.close().await;
    }
    let stages = outcome?;
    info!(
        duration_ms = started.elapsed().as_millis(),
        stages = stages.len(),
        "run finished"
    );

    Ok(RunResult {
        season: args.season,
        archive: archive.location().to_string(),
        dry_run: args.dry_run,
        stages,
    })
}
