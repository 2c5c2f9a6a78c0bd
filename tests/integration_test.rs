//! End-to-end tests over small CSV fixtures written to a temp directory.
//!
//! Each test builds its own database file, so they run independently.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use olympics_etl::build::outliers::{suppress_outliers, ColumnStats};
use olympics_etl::build::BuildOptions;
use olympics_etl::config::{Config, MissingMedal, SourceConfig, StoreConfig};
use olympics_etl::error::EtlError;
use olympics_etl::extract::extract;
use olympics_etl::model::NO_MEDAL;
use olympics_etl::pipeline::{self, clean_store, load_into};
use olympics_etl::report::{self, SUMMARY_FILE};
use olympics_etl::schema::{table_names, DependencyResolver};
use olympics_etl::ui::{Phase, SilentUi, Ui};
use olympics_etl::writer::SqliteStore;

/// Random seed for reproducible samples
const RANDOM_SEED: u64 = 42;

const ATHLETE_EVENTS: &str = r#""ID","Name","Sex","Age","Height","Weight","Team","NOC","Games","Year","Season","City","Sport","Event","Medal"
"1","A Dijiang","M",24,180,80,"China","CHN","1992 Summer",1992,"Summer","Barcelona","Basketball","Basketball Men's Basketball",NA
"2","A Lamusi","M",N/A,170,60,"China","CHN","2012 Summer",2012,"Summer","Barcelona","Judo","Judo Men's Extra-Lightweight",NA
"3","Tan Howe Liang","M",28,165,67,"Singapore","SGP","1992 Summer",1992,"Summer","Barcelona","Basketball","Basketball Men's Basketball","Gold"
"#;

const NOC_REGIONS: &str = "NOC,region,notes\nCHN,China,\nSGP,Singapore,\n";

// =============================================================================
// Fixtures
// =============================================================================

struct Fixture {
    dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        Self::with_sources(ATHLETE_EVENTS, NOC_REGIONS)
    }

    fn with_sources(athlete_events: &str, noc_regions: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("athlete_events.csv"), athlete_events).unwrap();
        fs::write(data.join("noc_regions.csv"), noc_regions).unwrap();

        let mut config = Config::default();
        config.store = StoreConfig {
            path: dir.path().join("olympics.db"),
        };
        config.sources = SourceConfig::in_dir(&data);
        config.output.results_dir = dir.path().join("analysis_results");
        Self { dir, config }
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::open(&self.config.store).expect("open store")
    }

    fn load(&self) -> SqliteStore {
        let mut store = self.store();
        let source = extract(&self.config.sources).expect("extract");
        load_into(&mut store, &source, &BuildOptions::default(), &mut SilentUi::new())
            .expect("load");
        store
    }
}

/// Records every phase change, log line and committed table
#[derive(Default)]
struct RecordingUi {
    phases: Vec<Phase>,
    logs: Vec<String>,
    tables: Vec<(&'static str, usize)>,
}

impl Ui for RecordingUi {
    fn set_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }
    fn table_persisted(&mut self, table: &'static str, rows: usize) {
        self.tables.push((table, rows));
    }
}

fn count(store: &SqliteStore, sql: &str) -> i64 {
    store
        .connection()
        .query_row(sql, [], |row| row.get(0))
        .expect("count query")
}

// =============================================================================
// Load
// =============================================================================

#[test]
fn test_load_populates_every_table() {
    let fixture = Fixture::new();
    let store = fixture.load();

    assert_eq!(store.table_count("countries").unwrap(), 2);
    assert_eq!(store.table_count("athletes").unwrap(), 3);
    assert_eq!(store.table_count("sports").unwrap(), 2);
    assert_eq!(store.table_count("cities").unwrap(), 1);
    assert_eq!(store.table_count("teams").unwrap(), 2);
    assert_eq!(store.table_count("events").unwrap(), 2);
    assert_eq!(store.table_count("games").unwrap(), 2);
    assert_eq!(store.table_count("results").unwrap(), 3);

    let orphans = count(
        &store,
        "SELECT COUNT(*) FROM results r LEFT JOIN countries c ON r.noc = c.noc
         WHERE c.noc IS NULL",
    );
    assert_eq!(orphans, 0);
    assert!(store.foreign_keys_enabled().unwrap());
}

#[test]
fn test_unparseable_age_stored_as_null() {
    let fixture = Fixture::new();
    let store = fixture.load();

    let nulls = count(&store, "SELECT COUNT(*) FROM results WHERE age IS NULL");
    assert_eq!(nulls, 1);
    let age: Option<f64> = store
        .connection()
        .query_row("SELECT age FROM results WHERE athlete_id = 2", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(age, None);
}

#[test]
fn test_tables_persisted_after_their_dependencies() {
    let fixture = Fixture::new();
    let mut store = fixture.store();
    let source = extract(&fixture.config.sources).unwrap();
    let report = load_into(
        &mut store,
        &source,
        &BuildOptions::default(),
        &mut SilentUi::new(),
    )
    .unwrap();

    let order: Vec<&str> = report.persisted.iter().map(|t| t.table).collect();
    assert_eq!(order.len(), table_names().len());

    let resolver = DependencyResolver::new();
    for (position, table) in order.iter().enumerate() {
        for dependency in resolver.dependencies_of(table) {
            let dep_position = order.iter().position(|t| *t == dependency).unwrap();
            assert!(
                dep_position < position,
                "{table} was written before its dependency {dependency}"
            );
        }
    }
}

#[test]
fn test_load_phases_build_before_reset() {
    let fixture = Fixture::new();
    let mut store = fixture.store();
    let source = extract(&fixture.config.sources).unwrap();
    let mut ui = RecordingUi::default();
    load_into(&mut store, &source, &BuildOptions::default(), &mut ui).unwrap();

    assert_eq!(
        ui.phases,
        vec![Phase::Building, Phase::ResettingSchema, Phase::Persisting]
    );
    let written: Vec<&str> = ui.tables.iter().map(|(t, _)| *t).collect();
    assert_eq!(written, table_names());
    assert_eq!(ui.tables.last(), Some(&("results", 3)));
}

#[test]
fn test_reload_replaces_previous_contents() {
    let fixture = Fixture::new();
    fixture.load();
    let store = fixture.load();

    assert_eq!(store.table_count("results").unwrap(), 3);
    assert_eq!(store.table_count("countries").unwrap(), 2);
    assert!(store.foreign_keys_enabled().unwrap());
}

#[test]
fn test_small_batches_commit_everything() {
    let fixture = Fixture::new();
    let mut store = fixture.store().with_batch_size(1);
    let source = extract(&fixture.config.sources).unwrap();
    let report = load_into(
        &mut store,
        &source,
        &BuildOptions::default(),
        &mut SilentUi::new(),
    )
    .unwrap();

    assert_eq!(report.total_rows(), 2 + 3 + 2 + 1 + 2 + 2 + 2 + 3);
}

#[test]
fn test_missing_source_is_fatal_and_keeps_existing_data() {
    let fixture = Fixture::new();
    fixture.load();

    let mut config = fixture.config.clone();
    config.sources = SourceConfig::in_dir(&fixture.dir.path().join("nowhere"));
    let err = pipeline::load(&config, &mut SilentUi::new()).unwrap_err();
    assert!(matches!(err, EtlError::MissingSource(_)), "got {err:?}");

    assert_eq!(fixture.store().table_count("results").unwrap(), 3);
}

#[test]
fn test_missing_column_is_fatal() {
    let fixture = Fixture::with_sources("ID,Name\n1,Someone\n", NOC_REGIONS);
    let err = extract(&fixture.config.sources).unwrap_err();
    assert!(matches!(err, EtlError::MalformedSource { .. }), "got {err:?}");
}

#[test]
fn test_unknown_noc_rows_dropped() {
    let events = format!(
        "{ATHLETE_EVENTS}{}\n",
        r#""4","Nobody","F",30,160,50,"Atlantis","XXX","1992 Summer",1992,"Summer","Barcelona","Judo","Judo Men's Extra-Lightweight",NA"#
    );
    let fixture = Fixture::with_sources(&events, NOC_REGIONS);
    let mut store = fixture.store();
    let source = extract(&fixture.config.sources).unwrap();
    let mut ui = RecordingUi::default();
    let report = load_into(&mut store, &source, &BuildOptions::default(), &mut ui).unwrap();

    assert_eq!(report.drops.unknown_country, 1);
    assert_eq!(store.table_count("results").unwrap(), 3);
    assert_eq!(store.table_count("countries").unwrap(), 2);
    assert!(ui.logs.iter().any(|l| l == "Data quality: 1 unknown country"));
}

#[test]
fn test_create_schema_leaves_empty_tables() {
    let fixture = Fixture::new();
    fixture.load();

    pipeline::create_schema(&fixture.config, &mut SilentUi::new()).unwrap();

    let store = fixture.store();
    for name in table_names() {
        assert!(store.table_exists(name).unwrap(), "{name} missing");
        assert_eq!(store.table_count(name).unwrap(), 0);
    }
}

// =============================================================================
// Clean
// =============================================================================

#[test]
fn test_clean_fills_medal_and_keeps_null_age() {
    let fixture = Fixture::new();
    let mut store = fixture.load();

    let report = clean_store(&mut store, MissingMedal::NoMedal, &mut SilentUi::new()).unwrap();
    assert_eq!(report.drops.dropped_rows(), 0);

    let no_medal = count(
        &store,
        &format!("SELECT COUNT(*) FROM results WHERE medal = '{NO_MEDAL}'"),
    );
    assert_eq!(no_medal, 2);
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM results WHERE medal IS NULL"),
        0
    );
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM results WHERE age IS NULL"),
        1
    );
    assert!(store.foreign_keys_enabled().unwrap());
}

#[test]
fn test_clean_twice_is_stable() {
    let fixture = Fixture::new();
    let mut store = fixture.load();

    clean_store(&mut store, MissingMedal::NoMedal, &mut SilentUi::new()).unwrap();
    let first = store.read_dataset().unwrap();
    clean_store(&mut store, MissingMedal::NoMedal, &mut SilentUi::new()).unwrap();
    let second = store.read_dataset().unwrap();

    assert_eq!(first, second);
}

// =============================================================================
// Outliers
// =============================================================================

#[test]
fn test_outlier_suppression_matches_three_sigma_band() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);

    for _ in 0..20 {
        let mut column: Vec<Option<f64>> = (0..200)
            .map(|_| {
                if rng.gen_bool(0.1) {
                    None
                } else {
                    Some(rng.gen_range(150.0..200.0))
                }
            })
            .collect();
        column.push(Some(rng.gen_range(400.0..500.0)));
        let before = column.clone();
        let stats = ColumnStats::from_values(before.iter().flatten().copied()).unwrap();

        let nulled = suppress_outliers(&mut column, |v| v);

        assert_eq!(column.len(), before.len(), "rows are never removed");
        let mut expected = 0;
        for (old, new) in before.iter().zip(&column) {
            match old {
                Some(v) if stats.is_outlier(*v) => {
                    expected += 1;
                    assert_eq!(*new, None);
                }
                other => assert_eq!(new, other),
            }
        }
        assert_eq!(nulled, expected);
        assert!(column.last().unwrap().is_none(), "extreme value kept");
    }
}

// =============================================================================
// Analysis
// =============================================================================

#[test]
fn test_analyze_after_load() {
    let fixture = Fixture::new();
    pipeline::load(&fixture.config, &mut SilentUi::new()).unwrap();

    let report = report::analyze(&fixture.config, &mut SilentUi::new()).unwrap();

    let dir = &fixture.config.output.results_dir;
    for file in [
        "medals_by_country.png",
        "athlete_trends.png",
        "sports_distribution.png",
        "gender_distribution.png",
        SUMMARY_FILE,
    ] {
        assert!(dir.join(file).exists(), "{file} not written");
    }
    assert_eq!(report.medals.len(), 1);
    assert_eq!(report.medals[0].country, "Singapore");
    assert_eq!(report.medals[0].gold, 1);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(summary["sports"].as_array().unwrap().len(), 2);
    assert!(Path::new(&report.charts[0]).starts_with(dir));
}
