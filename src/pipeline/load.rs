use serde::Serialize;
use tracing::{error, info};

use crate::build::{build_dataset, BuildOptions, DropReport};
use crate::config::Config;
use crate::error::Result;
use crate::extract::{extract, Extracted};
use crate::ui::{Phase, Ui};
use crate::writer::{PersistedTable, SqliteStore};

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Athlete-event rows read from the source
    pub source_rows: usize,
    /// Source rows that could not be decoded
    pub skipped_rows: usize,
    /// Tables in the order they were committed
    pub persisted: Vec<PersistedTable>,
    pub drops: DropReport,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.persisted.iter().map(|t| t.rows).sum()
    }
}

/// Read the source files and rebuild the whole database from them
pub fn load(config: &Config, ui: &mut impl Ui) -> Result<LoadReport> {
    run(config, ui).inspect_err(|e| error!(error = %e, "load failed"))
}

fn run(config: &Config, ui: &mut impl Ui) -> Result<LoadReport> {
    let mut store = super::open_store(config)?;
    ui.set_info(format!("Database: {}", config.store.path.display()));

    ui.set_phase(Phase::Extracting);
    let source = extract(&config.sources)?;
    ui.log(format!(
        "Read {} athlete events and {} NOC regions",
        source.athlete_events.len(),
        source.noc_regions.len()
    ));

    let options = BuildOptions {
        missing_medal: config.pipeline.load_missing_medal,
    };
    load_into(&mut store, &source, &options, ui)
}

/// Build every table from already-extracted records and persist them.
///
/// Building happens before the schema reset, so a builder failure leaves
/// the existing database untouched.
pub fn load_into(
    store: &mut SqliteStore,
    source: &Extracted,
    options: &BuildOptions,
    ui: &mut impl Ui,
) -> Result<LoadReport> {
    ui.set_phase(Phase::Building);
    let built = build_dataset(source, options)?;
    built.drops.log("load");
    if let Some(summary) = built.drops.summary() {
        ui.log(summary);
    }

    ui.set_phase(Phase::ResettingSchema);
    store.reset_schema(ui)?;

    ui.set_phase(Phase::Persisting);
    let persisted = store.persist_dataset(&built.dataset, ui)?;

    let report = LoadReport {
        source_rows: source.athlete_events.len(),
        skipped_rows: source.skipped_rows,
        persisted,
        drops: built.drops,
    };
    info!(
        rows = report.total_rows(),
        dropped = report.drops.dropped_rows(),
        "load finished"
    );
    Ok(report)
}
