//! Entry points: load, clean and schema creation.
//!
//! All of them share the same store lifecycle: reset the schema, then write
//! every table in creation order. Nothing is wrapped in a run-wide
//! transaction, so a failed run leaves whatever batches were committed.

pub mod clean;
pub mod load;

pub use clean::{clean, clean_dataset, clean_store, CleanReport};
pub use load::{load, load_into, LoadReport};

use tracing::error;

use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::schema::DependencyResolver;
use crate::ui::{Phase, Ui};
use crate::writer::SqliteStore;

/// Open the configured store with the configured batch size
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::open(&config.store)?.with_batch_size(config.pipeline.batch_size))
}

/// Drop and recreate the eight tables, leaving them empty
pub fn create_schema(config: &Config, ui: &mut impl Ui) -> Result<()> {
    reset(config, ui).inspect_err(|e| error!(error = %e, "schema creation failed"))
}

fn reset(config: &Config, ui: &mut impl Ui) -> Result<()> {
    let store = open_store(config)?;
    ui.set_phase(Phase::ResettingSchema);
    store.reset_schema(ui)
}

/// Registry tables in creation order, each with the tables it references
/// and the tables that reference it
pub fn describe_tables() -> Result<String> {
    let resolver = DependencyResolver::new();
    let order = resolver.creation_order().map_err(EtlError::Config)?;
    let mut out = String::from("Tables in creation order:\n");
    for table in order {
        out.push_str(&format!("\n  {}", table.name));
        let parents = resolver.dependencies_of(table.name);
        if !parents.is_empty() {
            out.push_str(&format!("\n      references    {}", parents.join(", ")));
        }
        let children = resolver.dependents_of(table.name);
        if !children.is_empty() {
            out.push_str(&format!("\n      referenced by {}", children.join(", ")));
        }
    }
    Ok(out)
}
