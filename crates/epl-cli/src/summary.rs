use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use epl_cli::types::{LoadOutcome, RunResult, StageSummary};

pub fn print_summary(result: &RunResult) {
    println!("Season: {}", result.season);
    println!("Archive: {}", result.archive);
    if result.dry_run {
        println!("Mode: dry run (nothing written to S3 or Postgres)");
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Destination"),
        header_cell("Fetched"),
        header_cell("Cleaned"),
        header_cell("Loaded"),
        header_cell("Skipped"),
        header_cell("Findings"),
    ]);
    apply_summary_table_style(&mut table);
    for index in [2, 3, 4, 5, 6] {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for stage in &result.stages {
        table.add_row(vec![
            Cell::new(stage.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(stage.destination.to_string()),
            Cell::new(stage.fetched_rows),
            Cell::new(stage.cleaned_rows),
            load_cell(&stage.load),
            count_cell(stage.skipped.len(), Color::Yellow),
            findings_cell(stage),
        ]);
    }
    println!("{table}");
    print_skipped_table(result);

    let failures: Vec<_> = result
        .stages
        .iter()
        .filter_map(|stage| match &stage.load {
            LoadOutcome::Failed(error) => Some((stage.name, error)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        eprintln!("Load errors:");
        for (stage, error) in failures {
            eprintln!("- {stage}: {error}");
        }
    }
}

fn print_skipped_table(result: &RunResult) {
    let rows: Vec<(&str, &String, &String)> = result
        .stages
        .iter()
        .flat_map(|stage| {
            stage
                .skipped
                .iter()
                .map(move |(key, reason)| (stage.name, key, reason))
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Key"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    for (stage, key, reason) in rows {
        table.add_row(vec![
            Cell::new(stage),
            Cell::new(key).fg(Color::Yellow),
            Cell::new(reason),
        ]);
    }
    println!();
    println!("Skipped:");
    println!("{table}");
}

fn load_cell(outcome: &LoadOutcome) -> Cell {
    match outcome {
        LoadOutcome::Loaded(rows) => Cell::new(rows).fg(Color::Green),
        LoadOutcome::Empty => dim_cell("empty"),
        LoadOutcome::DryRun => dim_cell("dry run"),
        LoadOutcome::Failed(_) => Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn findings_cell(stage: &StageSummary) -> Cell {
    match &stage.quality {
        Some(report) => count_cell(report.finding_count(), Color::Yellow),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
