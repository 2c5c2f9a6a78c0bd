use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, SourceConfig};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "olympics-etl")]
#[command(version, about = "Load Olympic Games history into a normalized SQLite database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Directory containing athlete_events.csv and noc_regions.csv
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory for charts and the analysis summary
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// Rows per insert transaction
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Show a terminal UI instead of log lines
    #[arg(long, global = true)]
    pub tui: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Rebuild the database from the source CSV files
    Load,

    /// Re-read every table, apply the cleaning rules and write it back
    Clean,

    /// Drop and recreate all tables, leaving them empty
    CreateSchema,

    /// Write charts and a JSON summary from the loaded database
    Analyze,

    /// List all table names in creation order
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Config file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.sources = SourceConfig::in_dir(dir);
        }
        if let Some(dir) = &self.results_dir {
            config.output.results_dir = dir.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.pipeline.batch_size = batch_size;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let cli = Cli::parse_from([
            "olympics-etl",
            "load",
            "--db",
            "/tmp/o.db",
            "--data-dir",
            "/srv/olympics",
            "--batch-size",
            "250",
        ]);
        assert_eq!(cli.command, Commands::Load);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/o.db"));
        assert_eq!(
            config.sources.noc_regions,
            PathBuf::from("/srv/olympics/noc_regions.csv")
        );
        assert_eq!(config.pipeline.batch_size, 250);
    }

    #[test]
    fn test_zero_batch_size_override_rejected() {
        let cli = Cli::parse_from(["olympics-etl", "clean", "--batch-size", "0"]);
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn test_subcommand_names() {
        let cli = Cli::parse_from(["olympics-etl", "create-schema", "--tui"]);
        assert_eq!(cli.command, Commands::CreateSchema);
        assert!(cli.tui);
        assert_eq!(cli.log_level, "info");
    }
}
