pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{EtlError, Result};
pub use pipeline::{clean, create_schema, load};
pub use report::analyze;
pub use ui::{ConsoleUi, Phase, SilentUi, Ui, UiApp};
pub use writer::SqliteStore;
