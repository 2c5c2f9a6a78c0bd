//! Table builders.
//!
//! Each builder is a pure function from the flat source records (and the
//! lookups produced by earlier builders) to the rows of one table. Surrogate
//! ids are assigned here, so foreign keys are known before anything touches
//! the store.

pub mod dimensions;
pub mod keys;
pub mod normalize;
pub mod outliers;
pub mod results;

pub use dimensions::*;
pub use keys::SurrogateKeys;
pub use results::{build_results, ResultLookups};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::MissingMedal;
use crate::error::Result;
use crate::extract::Extracted;
use crate::model::Dataset;

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub missing_medal: MissingMedal,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            missing_medal: MissingMedal::Null,
        }
    }
}

/// Rows left out, by reason, plus values nulled as outliers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropReport {
    pub missing_athlete_id: usize,
    pub missing_name: usize,
    pub unresolved_sport: usize,
    pub unresolved_city: usize,
    pub unknown_athlete: usize,
    pub unknown_game: usize,
    pub unknown_event: usize,
    pub unknown_team: usize,
    pub unknown_country: usize,
    pub nulled_outliers: usize,
}

impl DropReport {
    /// Result rows discarded because a reference did not resolve
    pub fn dropped_results(&self) -> usize {
        self.unknown_athlete
            + self.unknown_game
            + self.unknown_event
            + self.unknown_team
            + self.unknown_country
    }

    /// Any row discarded anywhere
    pub fn dropped_rows(&self) -> usize {
        self.missing_athlete_id
            + self.missing_name
            + self.unresolved_sport
            + self.unresolved_city
            + self.dropped_results()
    }

    /// One-line data-quality summary, `None` when nothing was dropped or
    /// nulled
    pub fn summary(&self) -> Option<String> {
        let reasons = [
            ("unknown athlete", self.unknown_athlete),
            ("unknown game", self.unknown_game),
            ("unknown event", self.unknown_event),
            ("unknown team", self.unknown_team),
            ("unknown country", self.unknown_country),
            ("unresolved sport", self.unresolved_sport),
            ("unresolved city", self.unresolved_city),
            ("missing athlete id", self.missing_athlete_id),
            ("missing name", self.missing_name),
        ];
        let mut parts: Vec<String> = reasons
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(reason, n)| format!("{n} {reason}"))
            .collect();
        if self.nulled_outliers > 0 {
            parts.push(format!("{} outlier values nulled", self.nulled_outliers));
        }
        if parts.is_empty() {
            return None;
        }
        Some(format!("Data quality: {}", parts.join(", ")))
    }

    /// Emit the data-quality summary
    pub fn log(&self, stage: &str) {
        if self.dropped_rows() > 0 {
            warn!(
                stage,
                dropped_results = self.dropped_results(),
                unknown_athlete = self.unknown_athlete,
                unknown_game = self.unknown_game,
                unknown_event = self.unknown_event,
                unknown_team = self.unknown_team,
                unknown_country = self.unknown_country,
                unresolved_sport = self.unresolved_sport,
                unresolved_city = self.unresolved_city,
                missing_athlete_id = self.missing_athlete_id,
                missing_name = self.missing_name,
                "rows dropped during {}",
                stage
            );
        }
        if self.nulled_outliers > 0 {
            info!(stage, nulled = self.nulled_outliers, "outlier measurements nulled");
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub dataset: Dataset,
    pub drops: DropReport,
}

/// Run every builder in dependency order
pub fn build_dataset(source: &Extracted, options: &BuildOptions) -> Result<BuildOutput> {
    let records = &source.athlete_events;
    let mut drops = DropReport::default();

    let (countries, nocs) = build_countries(&source.noc_regions);
    let (athletes, athlete_ids) = build_athletes(records, &mut drops);
    let (sports, sport_lookup) = build_sports(records);
    let (cities, city_lookup) = build_cities(records);
    let (teams, team_lookup) = build_teams(records);
    let (events, event_lookup) = build_events(records, &sport_lookup, &mut drops)?;
    let (games, game_lookup) = build_games(records, &city_lookup, &mut drops)?;

    let lookups = ResultLookups {
        athletes: &athlete_ids,
        countries: &nocs,
        sports: &sport_lookup,
        cities: &city_lookup,
        teams: &team_lookup,
        events: &event_lookup,
        games: &game_lookup,
    };
    let results = build_results(records, &lookups, options.missing_medal, &mut drops)?;

    Ok(BuildOutput {
        dataset: Dataset {
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
    })
}
