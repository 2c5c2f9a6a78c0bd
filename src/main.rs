use anyhow::{Context, Result};
use olympics_etl::{
    cli::{Cli, Commands},
    config::Config,
    logging,
    pipeline::{clean, create_schema, describe_tables, load},
    report::analyze,
    ui::{ConsoleUi, Ui, UiApp},
};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(&cli.log_level, cli.tui);

    if cli.command == Commands::ListTables {
        println!("{}", describe_tables()?);
        return Ok(());
    }

    let config = cli.resolve_config().context("invalid configuration")?;
    let start = Instant::now();

    if cli.tui {
        let mut app = UiApp::new()?;
        match execute(cli.command, &config, &mut app) {
            Ok(summary) => app.finish(&format!(
                "{} in {:.1}s",
                summary,
                start.elapsed().as_secs_f64()
            ))?,
            Err(e) => {
                app.restore()?;
                return Err(e);
            }
        }
    } else {
        let summary = execute(cli.command, &config, &mut ConsoleUi::new())?;
        println!("\n{} in {:.1}s", summary, start.elapsed().as_secs_f64());
    }

    Ok(())
}

/// Run one pipeline and describe its outcome in a line
fn execute(command: Commands, config: &Config, ui: &mut impl Ui) -> Result<String> {
    let summary = match command {
        Commands::Load => {
            let report = load(config, ui).context("load failed")?;
            format!(
                "Loaded {} rows into {:?} ({} source rows, {} skipped, {} dropped)",
                report.total_rows(),
                config.store.path,
                report.source_rows,
                report.skipped_rows,
                report.drops.dropped_rows()
            )
        }

        Commands::Clean => {
            let report = clean(config, ui).context("clean failed")?;
            let rows: usize = report.persisted.iter().map(|t| t.rows).sum();
            format!(
                "Cleaned {:?}: {} rows kept, {} dropped, {} outliers nulled",
                config.store.path,
                rows,
                report.drops.dropped_rows(),
                report.drops.nulled_outliers
            )
        }

        Commands::CreateSchema => {
            create_schema(config, ui).context("schema creation failed")?;
            format!("Created empty schema in {:?}", config.store.path)
        }

        Commands::Analyze => {
            let report = analyze(config, ui).context("analysis failed")?;
            format!(
                "Wrote {} charts to {:?}",
                report.charts.len(),
                config.output.results_dir
            )
        }

        Commands::ListTables => describe_tables()?,
    };
    Ok(summary)
}
