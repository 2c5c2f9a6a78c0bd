use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

use super::schema_gen::{generate_create_table, generate_indexes, generate_insert, generate_select_all};
use crate::config::StoreConfig;
use crate::error::{EtlError, Result};
use crate::model::{
    Athlete, City, Country, Dataset, Event, Game, Participation, Record, Sport, Team,
};
use crate::schema::{get_table, DependencyResolver};
use crate::ui::Ui;

const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Referential-integrity enforcement switched off for as long as the guard
/// lives. Dropping it always attempts to switch enforcement back on.
pub struct IntegrityChecksSuspended<'a> {
    conn: &'a Connection,
}

impl<'a> IntegrityChecksSuspended<'a> {
    pub fn acquire(conn: &'a Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        debug!("foreign key enforcement suspended");
        Ok(Self { conn })
    }
}

impl Drop for IntegrityChecksSuspended<'_> {
    fn drop(&mut self) {
        match self.conn.execute_batch("PRAGMA foreign_keys = ON;") {
            Ok(()) => debug!("foreign key enforcement restored"),
            Err(e) => warn!(error = %e, "failed to re-enable foreign key enforcement"),
        }
    }
}

/// A table that has been fully committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedTable {
    pub table: &'static str,
    pub rows: usize,
}

pub struct SqliteStore {
    conn: Connection,
    batch_size: usize,
}

impl SqliteStore {
    /// Open (creating if needed) the database and check that it answers
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let path = &config.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|source| EtlError::Connection {
            path: path.clone(),
            source,
        })?;
        Self::configure(conn, path)
    }

    /// Private in-memory database, for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| EtlError::Connection {
            path: ":memory:".into(),
            source,
        })?;
        Self::configure(conn, Path::new(":memory:"))
    }

    fn configure(conn: Connection, path: &Path) -> Result<Self> {
        let connection_error = |source| EtlError::Connection {
            path: path.to_path_buf(),
            source,
        };

        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(connection_error)?;

        // Enforce foreign keys and optimize for bulk insert
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )
        .map_err(connection_error)?;

        Ok(Self {
            conn,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let on: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        Ok(on == 1)
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Row count of a registry table
    pub fn table_count(&self, name: &str) -> Result<usize> {
        let schema =
            get_table(name).ok_or_else(|| EtlError::Config(format!("Unknown table: {}", name)))?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", schema.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Drop all eight tables if present, then create them again.
    ///
    /// Destroys any data they held. Foreign key enforcement is off for the
    /// duration and back on afterwards, on the error path too.
    pub fn reset_schema(&self, ui: &mut impl Ui) -> Result<()> {
        let resolver = DependencyResolver::new();
        let drop_order = resolver.drop_order().map_err(EtlError::Config)?;
        let creation_order = resolver.creation_order().map_err(EtlError::Config)?;

        let _suspended = IntegrityChecksSuspended::acquire(&self.conn)?;

        for schema in &drop_order {
            self.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {};", schema.name))
                .map_err(|source| EtlError::Schema {
                    table: schema.name,
                    source,
                })?;
            ui.log(format!("Dropped table {}", schema.name));
        }

        for schema in &creation_order {
            let schema_error = |source| EtlError::Schema {
                table: schema.name,
                source,
            };
            self.conn
                .execute(&generate_create_table(schema), [])
                .map_err(schema_error)?;
            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, []).map_err(schema_error)?;
            }
            ui.log(format!("Created table {}", schema.name));
        }

        info!(tables = creation_order.len(), "schema reset");
        Ok(())
    }

    /// Append rows to their table in batches, one transaction per batch.
    ///
    /// On failure, batches committed before the failing one stay in the
    /// store.
    pub fn persist_table<R: Record>(&mut self, rows: &[R], ui: &mut impl Ui) -> Result<usize> {
        let schema = R::schema();
        let sql = generate_insert(schema);
        let total = rows.len() as u64;
        let mut committed = 0;

        for batch in rows.chunks(self.batch_size) {
            insert_batch(&mut self.conn, &sql, batch).map_err(|source| EtlError::Insert {
                table: schema.name,
                committed,
                source,
            })?;
            committed += batch.len();
            ui.set_progress(committed as u64, total, schema.name);
        }

        ui.clear_progress();
        ui.table_persisted(schema.name, committed);
        info!(table = schema.name, rows = committed, "table persisted");
        Ok(committed)
    }

    /// Persist every table in creation order.
    ///
    /// A table is only started once all the tables it references have been
    /// committed. Returns the committed tables in the order they were written.
    pub fn persist_dataset(
        &mut self,
        dataset: &Dataset,
        ui: &mut impl Ui,
    ) -> Result<Vec<PersistedTable>> {
        let creation_order = DependencyResolver::new()
            .creation_order()
            .map_err(EtlError::Config)?;

        let mut persisted = Vec::with_capacity(creation_order.len());
        for schema in creation_order {
            let rows = match schema.name {
                "countries" => self.persist_table(&dataset.countries, ui)?,
                "athletes" => self.persist_table(&dataset.athletes, ui)?,
                "sports" => self.persist_table(&dataset.sports, ui)?,
                "cities" => self.persist_table(&dataset.cities, ui)?,
                "teams" => self.persist_table(&dataset.teams, ui)?,
                "events" => self.persist_table(&dataset.events, ui)?,
                "games" => self.persist_table(&dataset.games, ui)?,
                "results" => self.persist_table(&dataset.results, ui)?,
                other => return Err(EtlError::Config(format!("Unknown table: {}", other))),
            };
            persisted.push(PersistedTable {
                table: schema.name,
                rows,
            });
        }

        Ok(persisted)
    }

    pub fn read_table<R: Record>(&self) -> Result<Vec<R>> {
        let mut stmt = self.conn.prepare(&generate_select_all(R::schema()))?;
        let rows = stmt
            .query_map([], |row| R::from_row(row))?
            .collect::<rusqlite::Result<Vec<R>>>()?;
        Ok(rows)
    }

    /// Load all eight tables back into memory
    pub fn read_dataset(&self) -> Result<Dataset> {
        Ok(Dataset {
            countries: self.read_table::<Country>()?,
            athletes: self.read_table::<Athlete>()?,
            sports: self.read_table::<Sport>()?,
            cities: self.read_table::<City>()?,
            teams: self.read_table::<Team>()?,
            events: self.read_table::<Event>()?,
            games: self.read_table::<Game>()?,
            results: self.read_table::<Participation>()?,
        })
    }
}

/// Insert a batch of rows inside one committed transaction
fn insert_batch<R: Record>(conn: &mut Connection, sql: &str, batch: &[R]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(sql)?;
        for row in batch {
            for (idx, value) in row.values().iter().enumerate() {
                value.bind_to(idx + 1, &mut stmt)?;
            }
            stmt.raw_execute()?;
        }
    }
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::SilentUi;

    fn sport(id: i64, name: &str) -> Sport {
        Sport {
            sport_id: id,
            sport_name: name.into(),
        }
    }

    #[test]
    fn test_reset_on_empty_database() {
        let store = SqliteStore::in_memory().unwrap();
        store.reset_schema(&mut SilentUi::new()).unwrap();
        assert!(store.table_exists("results").unwrap());
        assert!(store.foreign_keys_enabled().unwrap());
    }

    #[test]
    fn test_reset_discards_data() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut ui = SilentUi::new();
        store.reset_schema(&mut ui).unwrap();
        store
            .persist_table(&[sport(1, "Judo"), sport(2, "Luge")], &mut ui)
            .unwrap();
        assert_eq!(store.table_count("sports").unwrap(), 2);

        store.reset_schema(&mut ui).unwrap();
        assert_eq!(store.table_count("sports").unwrap(), 0);
        assert!(store.foreign_keys_enabled().unwrap());
    }

    #[test]
    fn test_guard_restores_enforcement() {
        let store = SqliteStore::in_memory().unwrap();
        {
            let _guard = IntegrityChecksSuspended::acquire(store.connection()).unwrap();
            assert!(!store.foreign_keys_enabled().unwrap());
        }
        assert!(store.foreign_keys_enabled().unwrap());
    }

    #[test]
    fn test_failed_reset_restores_enforcement() {
        let store = SqliteStore::in_memory().unwrap();
        // A view cannot be removed with DROP TABLE, so the drop phase fails
        store
            .connection()
            .execute_batch("CREATE VIEW results AS SELECT 1;")
            .unwrap();

        let err = store.reset_schema(&mut SilentUi::new()).unwrap_err();

        assert!(
            matches!(err, EtlError::Schema { table: "results", .. }),
            "got {err:?}"
        );
        assert!(store.foreign_keys_enabled().unwrap());
    }

    #[test]
    fn test_batches_commit_independently() {
        let mut store = SqliteStore::in_memory().unwrap().with_batch_size(2);
        let mut ui = SilentUi::new();
        store.reset_schema(&mut ui).unwrap();

        // The fifth row repeats a sport name and violates UNIQUE
        let rows = vec![
            sport(1, "Judo"),
            sport(2, "Luge"),
            sport(3, "Golf"),
            sport(4, "Polo"),
            sport(5, "Judo"),
        ];
        let err = store.persist_table(&rows, &mut ui).unwrap_err();
        match err {
            EtlError::Insert {
                table, committed, ..
            } => {
                assert_eq!(table, "sports");
                assert_eq!(committed, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.table_count("sports").unwrap(), 4);
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut ui = SilentUi::new();
        store.reset_schema(&mut ui).unwrap();
        let event = Event {
            event_id: 1,
            event_name: "Luge Mixed".into(),
            sport_id: 42,
        };
        assert!(store.persist_table(&[event], &mut ui).is_err());
    }

    #[test]
    fn test_read_back_round_trip() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut ui = SilentUi::new();
        store.reset_schema(&mut ui).unwrap();
        let sports = vec![sport(1, "Judo"), sport(2, "Luge")];
        store.persist_table(&sports, &mut ui).unwrap();
        assert_eq!(store.read_table::<Sport>().unwrap(), sports);
    }

    #[test]
    fn test_unknown_table_count() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.table_count("medals; DROP TABLE x").is_err());
    }
}
