//! Read-only aggregate queries behind the charts.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryMedals {
    pub country: String,
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyAthleteStats {
    pub year: i64,
    pub season: Option<String>,
    pub athletes: i64,
    pub avg_age: Option<f64>,
    pub avg_height_cm: Option<f64>,
    pub avg_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportDistribution {
    pub sport: String,
    pub events: i64,
    pub athletes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderCount {
    pub year: i64,
    pub season: Option<String>,
    pub sex: String,
    pub athletes: i64,
}

/// Regions with the most medals. Only Gold, Silver and Bronze count, so the
/// "No Medal" placeholder never inflates a total.
pub fn medals_by_country(conn: &Connection, limit: usize) -> Result<Vec<CountryMedals>> {
    let mut stmt = conn.prepare(
        "SELECT c.region,
                SUM(CASE WHEN r.medal = 'Gold' THEN 1 ELSE 0 END),
                SUM(CASE WHEN r.medal = 'Silver' THEN 1 ELSE 0 END),
                SUM(CASE WHEN r.medal = 'Bronze' THEN 1 ELSE 0 END),
                COUNT(*) AS total
         FROM results r
         JOIN countries c ON r.noc = c.noc
         WHERE r.medal IN ('Gold', 'Silver', 'Bronze')
         GROUP BY c.region
         ORDER BY total DESC, c.region
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(CountryMedals {
                country: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                gold: row.get(1)?,
                silver: row.get(2)?,
                bronze: row.get(3)?,
                total: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Distinct athletes and mean measurements per edition
pub fn athlete_trends(conn: &Connection) -> Result<Vec<YearlyAthleteStats>> {
    let mut stmt = conn.prepare(
        "SELECT g.year, g.season,
                COUNT(DISTINCT r.athlete_id),
                AVG(r.age), AVG(r.height_cm), AVG(r.weight_kg)
         FROM results r
         JOIN games g ON r.game_id = g.game_id
         WHERE g.year IS NOT NULL
         GROUP BY g.year, g.season
         ORDER BY g.year, g.season",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(YearlyAthleteStats {
                year: row.get(0)?,
                season: row.get(1)?,
                athletes: row.get(2)?,
                avg_age: row.get(3)?,
                avg_height_cm: row.get(4)?,
                avg_weight_kg: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Events and distinct athletes per sport. Sports without events or
/// participations are kept with zero counts.
pub fn sports_distribution(conn: &Connection) -> Result<Vec<SportDistribution>> {
    let mut stmt = conn.prepare(
        "SELECT s.sport_name,
                COUNT(DISTINCT e.event_id) AS event_count,
                COUNT(DISTINCT r.athlete_id)
         FROM sports s
         LEFT JOIN events e ON s.sport_id = e.sport_id
         LEFT JOIN results r ON e.event_id = r.event_id
         GROUP BY s.sport_name
         ORDER BY event_count DESC, s.sport_name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(SportDistribution {
                sport: row.get(0)?,
                events: row.get(1)?,
                athletes: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Distinct athletes per sex per edition
pub fn gender_distribution(conn: &Connection) -> Result<Vec<GenderCount>> {
    let mut stmt = conn.prepare(
        "SELECT g.year, g.season, a.sex, COUNT(DISTINCT r.athlete_id)
         FROM results r
         JOIN games g ON r.game_id = g.game_id
         JOIN athletes a ON r.athlete_id = a.athlete_id
         WHERE g.year IS NOT NULL
         GROUP BY g.year, g.season, a.sex
         ORDER BY g.year, g.season, a.sex",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(GenderCount {
                year: row.get(0)?,
                season: row.get(1)?,
                sex: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                athletes: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
