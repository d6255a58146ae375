use epl_model::TableRef;
use epl_validate::QualityReport;

#[derive(Debug)]
pub struct RunResult {
    pub season: u16,
    pub archive: String,
    pub dry_run: bool,
    pub stages: Vec<StageSummary>,
}

impl RunResult {
    /// Whether any stage failed to load.
    pub fn has_errors(&self) -> bool {
        self.stages
            .iter()
            .any(|stage| matches!(stage.load, LoadOutcome::Failed(_)))
    }
}

#[derive(Debug)]
pub struct StageSummary {
    pub name: &'static str,
    pub destination: TableRef,
    /// Rows collected before cleaning.
    pub fetched_rows: usize,
    pub cleaned_rows: usize,
    /// Keys that produced no rows, with the reason.
    pub skipped: Vec<(String, String)>,
    pub load: LoadOutcome,
    /// `None` when there was nothing to check.
    pub quality: Option<QualityReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(u64),
    /// Nothing to load; the loader refused an empty table.
    Empty,
    /// `--dry-run`; no database connection was made.
    DryRun,
    Failed(String),
}
