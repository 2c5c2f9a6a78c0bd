//! Per-table normalization rules shared by the builders and the cleaning pass.

use std::collections::{HashMap, HashSet};

use super::keys::capitalize;
use super::outliers::suppress_outliers;
use super::DropReport;
use crate::config::MissingMedal;
use crate::model::{Athlete, Country, Event, Game, Participation, NO_MEDAL};

pub const UNKNOWN: &str = "Unknown";

/// Old id -> surviving id for rows collapsed by deduplication
pub type IdRemap = HashMap<i64, i64>;

/// Upper-case trimmed NOC, "Unknown" region, first occurrence per NOC wins
pub fn normalize_countries(rows: impl IntoIterator<Item = Country>) -> Vec<Country> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|mut country| {
            country.noc = country.noc.trim().to_uppercase();
            if country.noc.is_empty() || !seen.insert(country.noc.clone()) {
                return None;
            }
            country.region = country.region.trim().to_string();
            if country.region.is_empty() {
                country.region = UNKNOWN.to_string();
            }
            country.notes = country.notes.trim().to_string();
            Some(country)
        })
        .collect()
}

/// Trimmed name, "Unknown" sex, first occurrence per athlete id wins
pub fn normalize_athletes(rows: impl IntoIterator<Item = Athlete>) -> Vec<Athlete> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|mut athlete| {
            if !seen.insert(athlete.athlete_id) {
                return None;
            }
            athlete.name = athlete.name.trim().to_string();
            athlete.sex = athlete.sex.trim().to_string();
            if athlete.sex.is_empty() {
                athlete.sex = UNKNOWN.to_string();
            }
            Some(athlete)
        })
        .collect()
}

/// Trim names and collapse rows that share a name onto the first one.
///
/// Works for any single-name table (sports, cities, teams). Rows with an
/// empty name are dropped and their ids are left out of the remap.
pub fn normalize_named<T>(
    rows: impl IntoIterator<Item = T>,
    id: impl Fn(&T) -> i64,
    name: impl Fn(&mut T) -> &mut String,
) -> (Vec<T>, IdRemap) {
    let mut first_by_name: HashMap<String, i64> = HashMap::new();
    let mut remap = IdRemap::new();
    let mut kept = Vec::new();

    for mut row in rows {
        let trimmed = name(&mut row).trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        let row_id = id(&row);
        match first_by_name.get(&trimmed) {
            Some(&survivor) => {
                remap.insert(row_id, survivor);
            }
            None => {
                first_by_name.insert(trimmed.clone(), row_id);
                remap.insert(row_id, row_id);
                *name(&mut row) = trimmed;
                kept.push(row);
            }
        }
    }

    (kept, remap)
}

/// Re-point events at surviving sports, drop unresolvable ones, and collapse
/// duplicates on (name, sport).
pub fn normalize_events(
    rows: impl IntoIterator<Item = Event>,
    sports: &IdRemap,
    drops: &mut DropReport,
) -> (Vec<Event>, IdRemap) {
    let mut first_by_key: HashMap<(String, i64), i64> = HashMap::new();
    let mut remap = IdRemap::new();
    let mut kept = Vec::new();

    for mut event in rows {
        let Some(&sport_id) = sports.get(&event.sport_id) else {
            drops.unresolved_sport += 1;
            continue;
        };
        event.sport_id = sport_id;
        event.event_name = event.event_name.trim().to_string();
        if event.event_name.is_empty() {
            drops.missing_name += 1;
            continue;
        }
        let key = (event.event_name.clone(), sport_id);
        match first_by_key.get(&key) {
            Some(&survivor) => {
                remap.insert(event.event_id, survivor);
            }
            None => {
                first_by_key.insert(key, event.event_id);
                remap.insert(event.event_id, event.event_id);
                kept.push(event);
            }
        }
    }

    (kept, remap)
}

/// Re-point games at surviving cities, drop unresolvable ones, trim names
/// and capitalize the season.
pub fn normalize_games(
    rows: impl IntoIterator<Item = Game>,
    cities: &IdRemap,
    drops: &mut DropReport,
) -> Vec<Game> {
    rows.into_iter()
        .filter_map(|mut game| {
            let Some(&city_id) = cities.get(&game.city_id) else {
                drops.unresolved_city += 1;
                return None;
            };
            game.city_id = city_id;
            game.game_name = game.game_name.trim().to_string();
            game.season = game
                .season
                .as_deref()
                .map(capitalize)
                .filter(|s| !s.is_empty());
            Some(game)
        })
        .collect()
}

/// Medal value for a participation under the given policy
pub fn medal_or_default(medal: Option<String>, policy: MissingMedal) -> Option<String> {
    let medal = medal
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    match (medal, policy) {
        (Some(m), MissingMedal::Null) if m == NO_MEDAL => None,
        (Some(m), _) => Some(m),
        (None, MissingMedal::Null) => None,
        (None, MissingMedal::NoMedal) => Some(NO_MEDAL.to_string()),
    }
}

/// Null three-sigma outliers in age, height and weight. Returns values nulled.
pub fn suppress_measurement_outliers(rows: &mut [Participation]) -> usize {
    suppress_outliers(rows, |r| &mut r.age)
        + suppress_outliers(rows, |r| &mut r.height_cm)
        + suppress_outliers(rows, |r| &mut r.weight_kg)
}
