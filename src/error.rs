//! Error types for the load, clean and report pipelines.

use std::path::PathBuf;

/// Errors produced by the pipeline stages.
///
/// Per-row data problems never show up here: builders drop the row or null
/// the field and keep going. Everything in this enum aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store could not be opened or did not answer.
    #[error("cannot connect to store at {path:?}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A required source file does not exist.
    #[error("source file not found: {0:?}")]
    MissingSource(PathBuf),

    /// A source file exists but lacks a required column.
    #[error("malformed source {path:?}: {reason}")]
    MalformedSource { path: PathBuf, reason: String },

    /// A required source file has a header but no rows.
    #[error("source file {0:?} contains no records")]
    EmptySource(PathBuf),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Drop/create failure while resetting the schema.
    #[error("schema operation failed on table {table}: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Bulk insert failure. Earlier committed batches stay in the store.
    #[error("insert into {table} failed after {committed} rows: {source}")]
    Insert {
        table: &'static str,
        committed: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// A builder needed a lookup table that came out empty.
    #[error("cannot build {table}: lookup table {lookup} is empty")]
    EmptyLookup {
        table: &'static str,
        lookup: &'static str,
    },

    #[error("chart font could not be loaded")]
    Font,

    #[error("chart rendering failed: {0}")]
    Chart(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, EtlError>;
