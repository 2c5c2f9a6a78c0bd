use serde::Serialize;
use std::collections::HashSet;
use tracing::{error, info};

use crate::build::normalize::{
    medal_or_default, normalize_athletes, normalize_countries, normalize_events,
    normalize_games, normalize_named, suppress_measurement_outliers, IdRemap,
};
use crate::build::DropReport;
use crate::config::{Config, MissingMedal};
use crate::error::Result;
use crate::model::{Dataset, Participation};
use crate::ui::{Phase, Ui};
use crate::writer::{PersistedTable, SqliteStore};

#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    /// Tables in the order they were committed
    pub persisted: Vec<PersistedTable>,
    pub drops: DropReport,
}

/// Reload every table, apply the cleaning rules and write the result back
pub fn clean(config: &Config, ui: &mut impl Ui) -> Result<CleanReport> {
    run(config, ui).inspect_err(|e| error!(error = %e, "clean failed"))
}

fn run(config: &Config, ui: &mut impl Ui) -> Result<CleanReport> {
    let mut store = super::open_store(config)?;
    ui.set_info(format!("Database: {}", config.store.path.display()));
    clean_store(&mut store, config.pipeline.clean_missing_medal, ui)
}

pub fn clean_store(
    store: &mut SqliteStore,
    missing_medal: MissingMedal,
    ui: &mut impl Ui,
) -> Result<CleanReport> {
    ui.set_phase(Phase::Reading);
    let dataset = store.read_dataset()?;
    ui.log(format!("Loaded {} results", dataset.results.len()));

    ui.set_phase(Phase::Cleaning);
    let (cleaned, drops) = clean_dataset(dataset, missing_medal);
    drops.log("clean");
    if let Some(summary) = drops.summary() {
        ui.log(summary);
    }

    ui.set_phase(Phase::ResettingSchema);
    store.reset_schema(ui)?;

    ui.set_phase(Phase::Persisting);
    let persisted = store.persist_dataset(&cleaned, ui)?;
    info!(tables = persisted.len(), "clean finished");

    Ok(CleanReport { persisted, drops })
}

/// Apply the per-table rules, parents before children.
///
/// Rows collapsed by deduplication hand their id to the surviving row, and
/// children are re-pointed accordingly. Children whose parent is gone are
/// dropped.
pub fn clean_dataset(data: Dataset, missing_medal: MissingMedal) -> (Dataset, DropReport) {
    let mut drops = DropReport::default();

    let countries = normalize_countries(data.countries);
    let athletes = normalize_athletes(data.athletes);
    let (sports, sport_ids) = normalize_named(data.sports, |s| s.sport_id, |s| &mut s.sport_name);
    let (cities, city_ids) = normalize_named(data.cities, |c| c.city_id, |c| &mut c.city_name);
    let (teams, team_ids) = normalize_named(data.teams, |t| t.team_id, |t| &mut t.team_name);
    let (events, event_ids) = normalize_events(data.events, &sport_ids, &mut drops);
    let games = normalize_games(data.games, &city_ids, &mut drops);

    let parents = Parents {
        athletes: athletes.iter().map(|a| a.athlete_id).collect(),
        countries: countries.iter().map(|c| c.noc.clone()).collect(),
        games: games.iter().map(|g| g.game_id).collect(),
        events: event_ids,
        teams: team_ids,
    };
    let results = clean_results(data.results, &parents, missing_medal, &mut drops);

    (
        Dataset {
            countries,
            athletes,
            sports,
            cities,
            teams,
            events,
            games,
            results,
        },
        drops,
    )
}

struct Parents {
    athletes: HashSet<i64>,
    countries: HashSet<String>,
    games: HashSet<i64>,
    events: IdRemap,
    teams: IdRemap,
}

fn clean_results(
    rows: Vec<Participation>,
    parents: &Parents,
    missing_medal: MissingMedal,
    drops: &mut DropReport,
) -> Vec<Participation> {
    let mut results: Vec<Participation> = rows
        .into_iter()
        .filter_map(|mut result| {
            if !parents.athletes.contains(&result.athlete_id) {
                drops.unknown_athlete += 1;
                return None;
            }
            if !parents.games.contains(&result.game_id) {
                drops.unknown_game += 1;
                return None;
            }
            let Some(&event_id) = parents.events.get(&result.event_id) else {
                drops.unknown_event += 1;
                return None;
            };
            let Some(&team_id) = parents.teams.get(&result.team_id) else {
                drops.unknown_team += 1;
                return None;
            };
            result.noc = result.noc.trim().to_uppercase();
            if !parents.countries.contains(&result.noc) {
                drops.unknown_country += 1;
                return None;
            }
            result.event_id = event_id;
            result.team_id = team_id;
            result.medal = medal_or_default(result.medal, missing_medal);
            Some(result)
        })
        .collect();

    drops.nulled_outliers += suppress_measurement_outliers(&mut results);
    results
}
