//! Analysis over a loaded database: four PNG charts plus a JSON summary.

pub mod chart;
pub mod queries;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::ui::{Phase, Ui};
use crate::writer::SqliteStore;
use chart::{Plot, Series, BLUE, BRONZE, GOLD, GREEN, ORANGE, RED, SILVER};
pub use queries::{CountryMedals, GenderCount, SportDistribution, YearlyAthleteStats};

const TOP_COUNTRIES: usize = 10;
const TOP_SPORTS: usize = 15;
const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;
const MARGIN: u32 = 40;
const TOP: u32 = 80;
const BOTTOM: u32 = 70;
const LEFT: u32 = 90;

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub medals: Vec<CountryMedals>,
    pub trends: Vec<YearlyAthleteStats>,
    pub sports: Vec<SportDistribution>,
    pub gender: Vec<GenderCount>,
    /// Chart files written, in generation order
    pub charts: Vec<PathBuf>,
}

/// Open the configured store and write charts to the configured directory
pub fn analyze(config: &Config, ui: &mut impl Ui) -> Result<AnalysisReport> {
    run(config, ui).inspect_err(|e| error!(error = %e, "analysis failed"))
}

fn run(config: &Config, ui: &mut impl Ui) -> Result<AnalysisReport> {
    let store = crate::pipeline::open_store(config)?;
    ui.set_info(format!("Database: {}", config.store.path.display()));
    analyze_store(&store, &config.output.results_dir, ui)
}

pub fn analyze_store(
    store: &SqliteStore,
    results_dir: &Path,
    ui: &mut impl Ui,
) -> Result<AnalysisReport> {
    ui.set_phase(Phase::Analyzing);
    fs::create_dir_all(results_dir)?;
    let conn = store.connection();

    let medals = queries::medals_by_country(conn, TOP_COUNTRIES)?;
    let trends = queries::athlete_trends(conn)?;
    let sports = queries::sports_distribution(conn)?;
    let gender = queries::gender_distribution(conn)?;

    if trends.is_empty() {
        warn!("no results with a known year; charts will be empty");
    }

    let charts = vec![
        render_medals(&medals, &results_dir.join("medals_by_country.png"))?,
        render_trends(&trends, &results_dir.join("athlete_trends.png"))?,
        render_sports(&sports, &results_dir.join("sports_distribution.png"))?,
        render_gender(&gender, &results_dir.join("gender_distribution.png"))?,
    ];
    for (i, path) in charts.iter().enumerate() {
        ui.set_progress(i as u64 + 1, charts.len() as u64, "charts");
        ui.log(format!("Wrote {}", path.display()));
    }
    ui.clear_progress();

    let report = AnalysisReport {
        medals,
        trends,
        sports,
        gender,
        charts,
    };
    let summary = results_dir.join(SUMMARY_FILE);
    fs::write(&summary, serde_json::to_string_pretty(&report)?)?;
    info!(dir = %results_dir.display(), charts = report.charts.len(), "analysis written");
    Ok(report)
}

fn render_medals(medals: &[CountryMedals], path: &Path) -> Result<PathBuf> {
    let mut plot = Plot::new(WIDTH, HEIGHT)?;
    let whole = plot.area();
    plot.title(whole, "Top 10 countries by medal count");
    let area = whole.margins(TOP, MARGIN, BOTTOM, LEFT);
    let groups: Vec<Vec<f64>> = medals
        .iter()
        .map(|m| vec![m.gold as f64, m.silver as f64, m.bronze as f64])
        .collect();
    let labels: Vec<String> = medals.iter().map(|m| m.country.clone()).collect();
    plot.grouped_bars(area, &groups, &[GOLD, SILVER, BRONZE], &labels);
    plot.axis_labels(area, "Country", "Medals");
    plot.legend(area, &[("Gold", GOLD), ("Silver", SILVER), ("Bronze", BRONZE)]);
    plot.save(path)?;
    Ok(path.to_path_buf())
}

/// Athlete count, mean age, mean height and mean weight by year, one line
/// per season
fn render_trends(trends: &[YearlyAthleteStats], path: &Path) -> Result<PathBuf> {
    let mut plot = Plot::new(WIDTH, HEIGHT)?;
    let whole = plot.area();
    plot.title(whole, "Athlete trends by year");
    let panels = whole.margins(TOP / 2, 0, 0, 0).grid(2, 2);
    let metrics: [(&str, fn(&YearlyAthleteStats) -> Option<f64>); 4] = [
        ("Athletes", |t| Some(t.athletes as f64)),
        ("Mean age", |t| t.avg_age),
        ("Mean height (cm)", |t| t.avg_height_cm),
        ("Mean weight (kg)", |t| t.avg_weight_kg),
    ];

    for (panel, (name, metric)) in panels.into_iter().zip(metrics) {
        let mut by_season: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for t in trends {
            if let Some(value) = metric(t) {
                by_season
                    .entry(t.season.as_deref().unwrap_or(""))
                    .or_default()
                    .push((t.year as f64, value));
            }
        }
        let series: Vec<Series> = by_season
            .into_iter()
            .map(|(season, points)| Series {
                points,
                color: season_color(season),
            })
            .collect();
        let area = panel.margins(TOP / 2, MARGIN / 2, MARGIN + 10, LEFT / 2 + 20);
        plot.lines(area, &series);
        plot.axis_labels(area, "Year", name);
    }
    plot.legend(
        whole.margins(0, MARGIN / 2, 0, 0),
        &[("Summer", season_color("Summer")), ("Winter", season_color("Winter"))],
    );

    plot.save(path)?;
    Ok(path.to_path_buf())
}

fn render_sports(sports: &[SportDistribution], path: &Path) -> Result<PathBuf> {
    let mut plot = Plot::new(WIDTH, HEIGHT)?;
    let whole = plot.area();
    plot.title(whole, "Events per sport");
    let area = whole.margins(TOP, MARGIN, BOTTOM, 2 * LEFT);
    let top: Vec<&SportDistribution> = sports.iter().take(TOP_SPORTS).collect();
    let values: Vec<f64> = top.iter().map(|s| s.events as f64).collect();
    let labels: Vec<String> = top.iter().map(|s| s.sport.clone()).collect();
    plot.horizontal_bars(area, &values, GREEN, &labels);
    plot.axis_labels(area, "Events", "Sport");
    plot.save(path)?;
    Ok(path.to_path_buf())
}

fn render_gender(gender: &[GenderCount], path: &Path) -> Result<PathBuf> {
    let mut plot = Plot::new(WIDTH, HEIGHT)?;
    let whole = plot.area();
    plot.title(whole, "Athletes by sex");
    let area = whole.margins(TOP, MARGIN, BOTTOM, LEFT);

    // Summer and Winter editions share a year axis, so sum them per year
    let mut by_sex: BTreeMap<&str, BTreeMap<i64, f64>> = BTreeMap::new();
    for g in gender {
        *by_sex
            .entry(g.sex.as_str())
            .or_default()
            .entry(g.year)
            .or_default() += g.athletes as f64;
    }
    let series: Vec<Series> = by_sex
        .into_iter()
        .map(|(sex, years)| Series {
            points: years.into_iter().map(|(y, n)| (y as f64, n)).collect(),
            color: sex_color(sex),
        })
        .collect();
    plot.lines(area, &series);
    plot.axis_labels(area, "Year", "Athletes");
    plot.legend(area, &[("Female", sex_color("F")), ("Male", sex_color("M"))]);

    plot.save(path)?;
    Ok(path.to_path_buf())
}

fn season_color(season: &str) -> image::Rgb<u8> {
    match season {
        "Winter" => BLUE,
        _ => ORANGE,
    }
}

fn sex_color(sex: &str) -> image::Rgb<u8> {
    match sex {
        "F" => RED,
        _ => BLUE,
    }
}
