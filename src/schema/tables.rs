//! Table schema definitions for the Olympic history database

use super::types::*;

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static COUNTRIES: TableSchema = TableSchema {
    name: "countries",
    columns: &[
        Column::required("noc", ColumnType::Text),
        Column::new("region", ColumnType::Text),
        Column::new("notes", ColumnType::Text),
    ],
    primary_key: "noc",
    foreign_keys: &[],
    unique: &[],
};

pub static ATHLETES: TableSchema = TableSchema {
    name: "athletes",
    columns: &[
        Column::required("athlete_id", ColumnType::Integer),
        Column::required("athlete_name", ColumnType::Text),
        Column::new("sex", ColumnType::Text),
    ],
    primary_key: "athlete_id",
    foreign_keys: &[],
    unique: &[],
};

pub static SPORTS: TableSchema = TableSchema {
    name: "sports",
    columns: &[
        Column::required("sport_id", ColumnType::Integer),
        Column::required("sport_name", ColumnType::Text),
    ],
    primary_key: "sport_id",
    foreign_keys: &[],
    unique: &[&["sport_name"]],
};

pub static CITIES: TableSchema = TableSchema {
    name: "cities",
    columns: &[
        Column::required("city_id", ColumnType::Integer),
        Column::required("city_name", ColumnType::Text),
    ],
    primary_key: "city_id",
    foreign_keys: &[],
    unique: &[&["city_name"]],
};

pub static TEAMS: TableSchema = TableSchema {
    name: "teams",
    columns: &[
        Column::required("team_id", ColumnType::Integer),
        Column::required("team_name", ColumnType::Text),
    ],
    primary_key: "team_id",
    foreign_keys: &[],
    unique: &[&["team_name"]],
};

// =============================================================================
// Level 1 Dependencies
// =============================================================================

pub static EVENTS: TableSchema = TableSchema {
    name: "events",
    columns: &[
        Column::required("event_id", ColumnType::Integer),
        Column::required("event_name", ColumnType::Text),
        Column::required("sport_id", ColumnType::Integer),
    ],
    primary_key: "event_id",
    foreign_keys: &[ForeignKey::new("sport_id", "sports")],
    unique: &[&["event_name", "sport_id"]],
};

pub static GAMES: TableSchema = TableSchema {
    name: "games",
    columns: &[
        Column::required("game_id", ColumnType::Integer),
        Column::required("game_name", ColumnType::Text),
        Column::new("year", ColumnType::Integer),
        Column::new("season", ColumnType::Text),
        Column::required("city_id", ColumnType::Integer),
    ],
    primary_key: "game_id",
    foreign_keys: &[ForeignKey::new("city_id", "cities")],
    unique: &[],
};

// =============================================================================
// Fact Table
// =============================================================================

pub static RESULTS: TableSchema = TableSchema {
    name: "results",
    columns: &[
        Column::required("result_id", ColumnType::Integer),
        Column::required("athlete_id", ColumnType::Integer),
        Column::required("game_id", ColumnType::Integer),
        Column::required("event_id", ColumnType::Integer),
        Column::required("team_id", ColumnType::Integer),
        Column::required("noc", ColumnType::Text),
        Column::new("age", ColumnType::Real),
        Column::new("height_cm", ColumnType::Real),
        Column::new("weight_kg", ColumnType::Real),
        Column::new("medal", ColumnType::Text),
    ],
    primary_key: "result_id",
    foreign_keys: &[
        ForeignKey::new("athlete_id", "athletes"),
        ForeignKey::new("game_id", "games"),
        ForeignKey::new("event_id", "events"),
        ForeignKey::new("team_id", "teams"),
        ForeignKey::new("noc", "countries"),
    ],
    unique: &[],
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in creation order
pub static ALL_TABLES: &[&TableSchema] = &[
    // Wave 1: No dependencies
    &COUNTRIES,
    &ATHLETES,
    &SPORTS,
    &CITIES,
    &TEAMS,
    // Wave 2: Level 1 deps
    &EVENTS,
    &GAMES,
    // Wave 3: everything
    &RESULTS,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_foreign_key_targets_a_registered_column() {
        for table in ALL_TABLES {
            for fk in table.foreign_keys {
                let parent = get_table(fk.references_table)
                    .unwrap_or_else(|| panic!("{} references unknown table", table.name));
                assert_eq!(parent.primary_key, fk.references_column);
            }
        }
    }

    #[test]
    fn test_primary_key_is_a_column() {
        for table in ALL_TABLES {
            assert!(table.column_names().contains(&table.primary_key));
        }
    }

    #[test]
    fn test_eight_tables() {
        assert_eq!(table_names().len(), 8);
    }
}
