//! Typed rows for the eight tables and their mapping to SQLite values.

use rusqlite::Row;
use serde::Serialize;

use crate::schema::{
    TableSchema, ATHLETES, CITIES, COUNTRIES, EVENTS, GAMES, RESULTS, SPORTS, TEAMS,
};

/// Medal value written for participations without a medal when the
/// sentinel policy is active.
pub const NO_MEDAL: &str = "No Medal";

#[derive(Debug, Clone)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(v: Option<i64>) -> Self {
        v.map(SqlValue::Integer).unwrap_or(SqlValue::Null)
    }
}

impl From<Option<f64>> for SqlValue {
    fn from(v: Option<f64>) -> Self {
        v.map(SqlValue::Real).unwrap_or(SqlValue::Null)
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(v: Option<&str>) -> Self {
        v.map(SqlValue::from).unwrap_or(SqlValue::Null)
    }
}

/// A row type bound to one table of the registry.
///
/// `values` and `from_row` both follow the column order of `schema()`.
pub trait Record: Sized {
    fn schema() -> &'static TableSchema;
    fn values(&self) -> Vec<SqlValue>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub noc: String,
    pub region: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Athlete {
    pub athlete_id: i64,
    pub name: String,
    pub sex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sport {
    pub sport_id: i64,
    pub sport_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    pub city_id: i64,
    pub city_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub team_id: i64,
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_id: i64,
    pub event_name: String,
    pub sport_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    pub game_id: i64,
    pub game_name: String,
    pub year: Option<i64>,
    pub season: Option<String>,
    pub city_id: i64,
}

/// One athlete's participation in one event at one edition of the games.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participation {
    pub result_id: i64,
    pub athlete_id: i64,
    pub game_id: i64,
    pub event_id: i64,
    pub team_id: i64,
    pub noc: String,
    pub age: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub medal: Option<String>,
}

impl Record for Country {
    fn schema() -> &'static TableSchema {
        &COUNTRIES
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.noc.as_str().into(),
            self.region.as_str().into(),
            self.notes.as_str().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            noc: row.get(0)?,
            region: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            notes: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        })
    }
}

impl Record for Athlete {
    fn schema() -> &'static TableSchema {
        &ATHLETES
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.athlete_id.into(),
            self.name.as_str().into(),
            self.sex.as_str().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            athlete_id: row.get(0)?,
            name: row.get(1)?,
            sex: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        })
    }
}

impl Record for Sport {
    fn schema() -> &'static TableSchema {
        &SPORTS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.sport_id.into(), self.sport_name.as_str().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            sport_id: row.get(0)?,
            sport_name: row.get(1)?,
        })
    }
}

impl Record for City {
    fn schema() -> &'static TableSchema {
        &CITIES
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.city_id.into(), self.city_name.as_str().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            city_id: row.get(0)?,
            city_name: row.get(1)?,
        })
    }
}

impl Record for Team {
    fn schema() -> &'static TableSchema {
        &TEAMS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.team_id.into(), self.team_name.as_str().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            team_id: row.get(0)?,
            team_name: row.get(1)?,
        })
    }
}

impl Record for Event {
    fn schema() -> &'static TableSchema {
        &EVENTS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.event_id.into(),
            self.event_name.as_str().into(),
            self.sport_id.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            event_id: row.get(0)?,
            event_name: row.get(1)?,
            sport_id: row.get(2)?,
        })
    }
}

impl Record for Game {
    fn schema() -> &'static TableSchema {
        &GAMES
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.game_id.into(),
            self.game_name.as_str().into(),
            self.year.into(),
            self.season.as_deref().into(),
            self.city_id.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            game_id: row.get(0)?,
            game_name: row.get(1)?,
            year: row.get(2)?,
            season: row.get(3)?,
            city_id: row.get(4)?,
        })
    }
}

impl Record for Participation {
    fn schema() -> &'static TableSchema {
        &RESULTS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.result_id.into(),
            self.athlete_id.into(),
            self.game_id.into(),
            self.event_id.into(),
            self.team_id.into(),
            self.noc.as_str().into(),
            self.age.into(),
            self.height_cm.into(),
            self.weight_kg.into(),
            self.medal.as_deref().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            result_id: row.get(0)?,
            athlete_id: row.get(1)?,
            game_id: row.get(2)?,
            event_id: row.get(3)?,
            team_id: row.get(4)?,
            noc: row.get(5)?,
            age: row.get(6)?,
            height_cm: row.get(7)?,
            weight_kg: row.get(8)?,
            medal: row.get(9)?,
        })
    }
}

/// The full contents of the eight tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub countries: Vec<Country>,
    pub athletes: Vec<Athlete>,
    pub sports: Vec<Sport>,
    pub cities: Vec<City>,
    pub teams: Vec<Team>,
    pub events: Vec<Event>,
    pub games: Vec<Game>,
    pub results: Vec<Participation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_follow_schema_column_order() {
        let result = Participation {
            result_id: 1,
            athlete_id: 7,
            game_id: 2,
            event_id: 3,
            team_id: 4,
            noc: "NOR".into(),
            age: None,
            height_cm: Some(181.0),
            weight_kg: None,
            medal: Some("Gold".into()),
        };
        let values = result.values();
        assert_eq!(values.len(), Participation::schema().columns.len());
        assert!(matches!(values[5], SqlValue::Text(ref s) if s == "NOR"));
        assert!(matches!(values[6], SqlValue::Null));
        assert!(matches!(values[7], SqlValue::Real(h) if h == 181.0));
    }

    #[test]
    fn test_every_record_matches_its_schema_width() {
        let game = Game {
            game_id: 1,
            game_name: "1992 Summer".into(),
            year: Some(1992),
            season: Some("Summer".into()),
            city_id: 1,
        };
        assert_eq!(game.values().len(), Game::schema().columns.len());
        let country = Country {
            noc: "ESP".into(),
            region: "Spain".into(),
            notes: String::new(),
        };
        assert_eq!(country.values().len(), Country::schema().columns.len());
    }
}
