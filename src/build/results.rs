//! Builder for the results fact table.

use std::collections::HashSet;

use super::dimensions::{EventLookup, GameLookup, NameLookup};
use super::keys::{clean_text, parse_id, parse_number};
use super::normalize::{medal_or_default, suppress_measurement_outliers};
use super::DropReport;
use crate::config::MissingMedal;
use crate::error::{EtlError, Result};
use crate::extract::AthleteEventRecord;
use crate::model::Participation;

/// Everything a result row needs to resolve its foreign keys
pub struct ResultLookups<'a> {
    pub athletes: &'a HashSet<i64>,
    pub countries: &'a HashSet<String>,
    pub sports: &'a NameLookup,
    pub cities: &'a NameLookup,
    pub teams: &'a NameLookup,
    pub events: &'a EventLookup,
    pub games: &'a GameLookup,
}

impl ResultLookups<'_> {
    fn require_populated(&self) -> Result<()> {
        let lookups = [
            ("athletes", self.athletes.is_empty()),
            ("countries", self.countries.is_empty()),
            ("teams", self.teams.is_empty()),
            ("events", self.events.is_empty()),
            ("games", self.games.is_empty()),
        ];
        match lookups.into_iter().find(|(_, empty)| *empty) {
            Some((lookup, _)) => Err(EtlError::EmptyLookup {
                table: "results",
                lookup,
            }),
            None => Ok(()),
        }
    }
}

/// One result per source participation whose references all resolve.
///
/// Unparseable measurements become `None`; three-sigma outliers are nulled
/// afterwards. Result ids are assigned in source order.
pub fn build_results(
    records: &[AthleteEventRecord],
    lookups: &ResultLookups<'_>,
    missing_medal: MissingMedal,
    drops: &mut DropReport,
) -> Result<Vec<Participation>> {
    lookups.require_populated()?;

    let mut results = Vec::with_capacity(records.len());
    for record in records {
        if let Some(mut result) = resolve(record, lookups, drops) {
            result.result_id = results.len() as i64 + 1;
            result.medal = medal_or_default(clean_text(record.medal.as_deref()), missing_medal);
            results.push(result);
        }
    }

    drops.nulled_outliers += suppress_measurement_outliers(&mut results);
    Ok(results)
}

fn resolve(
    record: &AthleteEventRecord,
    lookups: &ResultLookups<'_>,
    drops: &mut DropReport,
) -> Option<Participation> {
    let athlete_id = match parse_id(record.id.as_deref()) {
        Some(id) if lookups.athletes.contains(&id) => id,
        _ => {
            drops.unknown_athlete += 1;
            return None;
        }
    };

    let game_id = clean_text(record.city.as_deref())
        .and_then(|city| lookups.cities.get(&city).copied())
        .zip(clean_text(record.games.as_deref()))
        .and_then(|(city_id, game)| lookups.games.get(&(game, city_id)).copied());
    let Some(game_id) = game_id else {
        drops.unknown_game += 1;
        return None;
    };

    let event_id = clean_text(record.sport.as_deref())
        .and_then(|sport| lookups.sports.get(&sport).copied())
        .zip(clean_text(record.event.as_deref()))
        .and_then(|(sport_id, event)| lookups.events.get(&(event, sport_id)).copied());
    let Some(event_id) = event_id else {
        drops.unknown_event += 1;
        return None;
    };

    let team_id = clean_text(record.team.as_deref())
        .and_then(|team| lookups.teams.get(&team).copied());
    let Some(team_id) = team_id else {
        drops.unknown_team += 1;
        return None;
    };

    let noc = clean_text(record.noc.as_deref())
        .map(|noc| noc.to_uppercase())
        .filter(|noc| lookups.countries.contains(noc));
    let Some(noc) = noc else {
        drops.unknown_country += 1;
        return None;
    };

    Some(Participation {
        result_id: 0,
        athlete_id,
        game_id,
        event_id,
        team_id,
        noc,
        age: parse_number(record.age.as_deref()),
        height_cm: parse_number(record.height.as_deref()),
        weight_kg: parse_number(record.weight.as_deref()),
        medal: None,
    })
}
