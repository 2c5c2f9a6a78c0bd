//! Builders for the lookup tables: everything except results.

use std::collections::{HashMap, HashSet};

use super::keys::{capitalize, clean_text, parse_id, SurrogateKeys};
use super::normalize::{normalize_athletes, normalize_countries, UNKNOWN};
use super::DropReport;
use crate::error::{EtlError, Result};
use crate::extract::{AthleteEventRecord, NocRegionRecord};
use crate::model::{Athlete, City, Country, Event, Game, Sport, Team};

/// NOC that is referenced by athlete events but absent from the regions file
pub const SYNTHESIZED_NOC: &str = "SGP";

/// Name -> surrogate id
pub type NameLookup = HashMap<String, i64>;

pub fn build_countries(records: &[NocRegionRecord]) -> (Vec<Country>, HashSet<String>) {
    let mut countries = normalize_countries(records.iter().map(|r| Country {
        noc: r.noc.clone().unwrap_or_default(),
        region: r.region.clone().unwrap_or_default(),
        notes: r.notes.clone().unwrap_or_default(),
    }));

    if !countries.iter().any(|c| c.noc == SYNTHESIZED_NOC) {
        countries.push(Country {
            noc: SYNTHESIZED_NOC.to_string(),
            region: "Singapore".to_string(),
            notes: "Added manually".to_string(),
        });
    }

    let nocs = countries.iter().map(|c| c.noc.clone()).collect();
    (countries, nocs)
}

/// Athletes keyed by their source id. Rows without a usable id or name are
/// skipped.
pub fn build_athletes(
    records: &[AthleteEventRecord],
    drops: &mut DropReport,
) -> (Vec<Athlete>, HashSet<i64>) {
    let mut rows = Vec::new();
    for record in records {
        let Some(athlete_id) = parse_id(record.id.as_deref()) else {
            drops.missing_athlete_id += 1;
            continue;
        };
        let Some(name) = clean_text(record.name.as_deref()) else {
            drops.missing_name += 1;
            continue;
        };
        rows.push(Athlete {
            athlete_id,
            name,
            sex: clean_text(record.sex.as_deref()).unwrap_or_else(|| UNKNOWN.to_string()),
        });
    }

    let athletes = normalize_athletes(rows);
    let ids = athletes.iter().map(|a| a.athlete_id).collect();
    (athletes, ids)
}

/// Distinct trimmed names in source order, each with a fresh id
fn build_named<T>(
    values: impl Iterator<Item = Option<String>>,
    make: impl Fn(i64, String) -> T,
) -> (Vec<T>, NameLookup) {
    let mut keys = SurrogateKeys::new();
    let mut rows = Vec::new();
    for name in values.flatten() {
        let (id, fresh) = keys.assign(name.clone());
        if fresh {
            rows.push(make(id, name));
        }
    }
    (rows, keys.into_lookup())
}

pub fn build_sports(records: &[AthleteEventRecord]) -> (Vec<Sport>, NameLookup) {
    build_named(
        records.iter().map(|r| clean_text(r.sport.as_deref())),
        |sport_id, sport_name| Sport {
            sport_id,
            sport_name,
        },
    )
}

pub fn build_cities(records: &[AthleteEventRecord]) -> (Vec<City>, NameLookup) {
    build_named(
        records.iter().map(|r| clean_text(r.city.as_deref())),
        |city_id, city_name| City { city_id, city_name },
    )
}

pub fn build_teams(records: &[AthleteEventRecord]) -> (Vec<Team>, NameLookup) {
    build_named(
        records.iter().map(|r| clean_text(r.team.as_deref())),
        |team_id, team_name| Team { team_id, team_name },
    )
}

/// (event name, sport id) -> event id
pub type EventLookup = HashMap<(String, i64), i64>;

pub fn build_events(
    records: &[AthleteEventRecord],
    sports: &NameLookup,
    drops: &mut DropReport,
) -> Result<(Vec<Event>, EventLookup)> {
    if sports.is_empty() {
        return Err(EtlError::EmptyLookup {
            table: "events",
            lookup: "sports",
        });
    }

    let mut keys = SurrogateKeys::new();
    let mut rows = Vec::new();
    for record in records {
        let Some(event_name) = clean_text(record.event.as_deref()) else {
            drops.missing_name += 1;
            continue;
        };
        let sport = clean_text(record.sport.as_deref());
        let Some(sport_id) = sport.and_then(|s| sports.get(&s).copied()) else {
            drops.unresolved_sport += 1;
            continue;
        };
        let (event_id, fresh) = keys.assign((event_name.clone(), sport_id));
        if fresh {
            rows.push(Event {
                event_id,
                event_name,
                sport_id,
            });
        }
    }

    Ok((rows, keys.into_lookup()))
}

/// (game name, city id) -> game id
pub type GameLookup = HashMap<(String, i64), i64>;

/// Games are distinct on (name, year, season, city). A result finds its game
/// by (name, city); the first matching game wins.
pub fn build_games(
    records: &[AthleteEventRecord],
    cities: &NameLookup,
    drops: &mut DropReport,
) -> Result<(Vec<Game>, GameLookup)> {
    if cities.is_empty() {
        return Err(EtlError::EmptyLookup {
            table: "games",
            lookup: "cities",
        });
    }

    let mut keys: SurrogateKeys<(String, Option<i64>, Option<String>, i64)> = SurrogateKeys::new();
    let mut lookup = GameLookup::new();
    let mut rows = Vec::new();
    for record in records {
        let Some(game_name) = clean_text(record.games.as_deref()) else {
            drops.missing_name += 1;
            continue;
        };
        let city = clean_text(record.city.as_deref());
        let Some(city_id) = city.and_then(|c| cities.get(&c).copied()) else {
            drops.unresolved_city += 1;
            continue;
        };
        let year = parse_id(record.year.as_deref());
        let season = clean_text(record.season.as_deref()).map(|s| capitalize(&s));

        let (game_id, fresh) = keys.assign((game_name.clone(), year, season.clone(), city_id));
        if fresh {
            lookup.entry((game_name.clone(), city_id)).or_insert(game_id);
            rows.push(Game {
                game_id,
                game_name,
                year,
                season,
                city_id,
            });
        }
    }

    Ok((rows, lookup))
}
