//! Progress narration.
//!
//! Pipelines report what they are doing through the [`Ui`] trait:
//! - Current phase (Extracting, Building, Resetting schema, ...)
//! - Progress (current/total with a label; for table writes the label is
//!   the table name)
//! - Committed row count per table
//! - Activity log, including the data-quality summary
//!
//! [`ConsoleUi`] narrates through `tracing`, [`UiApp`] draws a terminal UI
//! and [`SilentUi`] discards everything.

mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{debug, info};

use components::{ActivityLog, Header, ProgressLine, TableBoard};

/// Pipeline phases shown in the status panel
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Extracting,
    Building,
    ResettingSchema,
    Persisting,
    Reading,
    Cleaning,
    Analyzing,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Extracting => write!(f, "Reading source files"),
            Phase::Building => write!(f, "Building tables"),
            Phase::ResettingSchema => write!(f, "Resetting schema"),
            Phase::Persisting => write!(f, "Writing tables"),
            Phase::Reading => write!(f, "Reading tables"),
            Phase::Cleaning => write!(f, "Cleaning tables"),
            Phase::Analyzing => write!(f, "Running analysis"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress information for the current operation
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Trait for UI implementations - allows console, TUI and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
    /// Every batch of `table` is committed, `rows` rows in total
    fn table_persisted(&mut self, table: &'static str, rows: usize);
}

/// Narrates through `tracing` events; the default for non-interactive runs
#[derive(Default)]
pub struct ConsoleUi;

impl ConsoleUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for ConsoleUi {
    fn set_phase(&mut self, phase: Phase) {
        info!("{}", phase);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        debug!(current, total, "{}", label.into());
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        info!("{}", message.into());
    }

    fn table_persisted(&mut self, table: &'static str, rows: usize) {
        info!("{}: {} records", table, rows);
    }
}

/// Main UI application state - full TUI implementation
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    header: Header,
    progress: ProgressLine,
    board: TableBoard,
    log: ActivityLog,
}

impl UiApp {
    /// Create a new UI application and enter the alternate screen
    pub fn new() -> Result<Self> {
        // Setup terminal
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            header: Header::new(),
            progress: ProgressLine::new(),
            board: TableBoard::new(),
            log: ActivityLog::new(),
        })
    }

    /// Draw the UI
    fn draw(&mut self) -> Result<()> {
        let header = &self.header;
        let progress = &self.progress;
        let board = &self.board;
        let log = &self.log;

        self.terminal.draw(|frame| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Phase
                    Constraint::Length(1), // Progress line
                    Constraint::Min(5),    // Tables and activity
                ])
                .split(frame.area());
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(34), Constraint::Min(20)])
                .split(rows[2]);

            header.render(frame, rows[0]);
            progress.render(frame, rows[1]);
            board.render(frame, body[0]);
            log.render(frame, body[1]);
        })?;

        Ok(())
    }

    /// Finish the UI and restore the terminal
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.set_phase(Phase::Complete);
        self.clear_progress();
        self.log(summary);
        self.draw()?;

        // Wait for keypress before exiting
        self.log("Press any key to exit...");
        self.draw()?;

        loop {
            if event::poll(Duration::from_millis(100))? {
                if let CrosstermEvent::Key(_) = event::read()? {
                    break;
                }
            }
        }

        self.restore()
    }

    /// Restore terminal without waiting
    pub fn restore(mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        if phase == Phase::ResettingSchema {
            self.board.reset();
        }
        self.header.set_phase(phase);
        self.draw().ok();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.header.set_info(info);
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let label = label.into();
        // Table batches go to the board, anything else to the progress line
        if !self.board.writing(&label, current, total) {
            self.progress.set(Progress::new(current, total, label));
        }
        self.draw().ok();
    }

    fn clear_progress(&mut self) {
        self.progress.clear();
        self.draw().ok();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log.add(message);
        self.draw().ok();
    }

    fn table_persisted(&mut self, table: &'static str, rows: usize) {
        self.board.committed(table, rows);
        self.log.add(format!("{}: {} records", table, rows));
        self.draw().ok();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        // Best effort cleanup
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
    fn table_persisted(&mut self, _table: &'static str, _rows: usize) {}
}
