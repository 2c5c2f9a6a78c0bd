//! Panels of the terminal interface

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, LineGauge, Paragraph, Row, Table};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Phase, Progress};
use crate::schema::ALL_TABLES;

const LOG_CAPACITY: usize = 200;

fn border() -> Style {
    Style::default().fg(Color::Blue)
}

/// Current phase, with the store being worked on in the title
pub struct Header {
    phase: Phase,
    info: String,
}

impl Header {
    pub fn new() -> Self {
        Self {
            phase: Phase::Extracting,
            info: String::new(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (glyph, color) = match self.phase {
            Phase::Extracting | Phase::Reading => ("⤷", Color::Cyan),
            Phase::Building | Phase::Cleaning => ("⚙", Color::Cyan),
            Phase::ResettingSchema => ("◐", Color::Yellow),
            Phase::Persisting => ("↓", Color::Cyan),
            Phase::Analyzing => ("▤", Color::Magenta),
            Phase::Complete => ("✓", Color::Green),
        };
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);

        let title = if self.info.is_empty() {
            " Olympics ETL ".to_string()
        } else {
            format!(" Olympics ETL · {} ", self.info)
        };
        let line = Line::from(vec![
            Span::styled(format!(" {glyph} "), style),
            Span::styled(self.phase.to_string(), style),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border());
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

/// Progress of whatever is not tracked per table, such as chart rendering
pub struct ProgressLine {
    progress: Option<Progress>,
}

impl ProgressLine {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(progress) = &self.progress else {
            return;
        };
        let gauge = LineGauge::default()
            .label(format!(" {} {}/{} ", progress.label, progress.current, progress.total))
            .filled_style(Style::default().fg(Color::Cyan))
            .unfilled_style(Style::default().fg(Color::DarkGray))
            .ratio(progress.ratio().min(1.0));
        frame.render_widget(gauge, area);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TableState {
    Pending,
    Writing { done: u64, total: u64 },
    Committed(usize),
}

/// One line per table in creation order with its committed row count
pub struct TableBoard {
    rows: Vec<(&'static str, TableState)>,
}

impl TableBoard {
    pub fn new() -> Self {
        Self {
            rows: ALL_TABLES
                .iter()
                .map(|t| (t.name, TableState::Pending))
                .collect(),
        }
    }

    /// Forget earlier counts; the schema is about to be recreated
    pub fn reset(&mut self) {
        for (_, state) in &mut self.rows {
            *state = TableState::Pending;
        }
    }

    /// Batch progress for `table`. Returns false if `table` is not on the
    /// board.
    pub fn writing(&mut self, table: &str, done: u64, total: u64) -> bool {
        self.update(table, TableState::Writing { done, total })
    }

    pub fn committed(&mut self, table: &str, rows: usize) -> bool {
        self.update(table, TableState::Committed(rows))
    }

    fn update(&mut self, table: &str, state: TableState) -> bool {
        match self.rows.iter_mut().find(|(name, _)| *name == table) {
            Some(entry) => {
                entry.1 = state;
                true
            }
            None => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = self.rows.iter().map(|(name, state)| {
            let (count, status) = match *state {
                TableState::Pending => (
                    String::new(),
                    Span::styled("pending", Style::default().fg(Color::DarkGray)),
                ),
                TableState::Writing { done, total } => {
                    let percent = if total == 0 { 0 } else { done * 100 / total };
                    (
                        done.to_string(),
                        Span::styled(format!("{percent}%"), Style::default().fg(Color::Cyan)),
                    )
                }
                TableState::Committed(rows) => (
                    rows.to_string(),
                    Span::styled("committed", Style::default().fg(Color::Green)),
                ),
            };
            Row::new(vec![Cell::from(*name), Cell::from(count), Cell::from(status)])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["table", "rows", "status"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Tables ")
                .border_style(border()),
        );
        frame.render_widget(table, area);
    }
}

/// Most recent messages, newest last. Data-quality lines stand out.
pub struct ActivityLog {
    entries: VecDeque<String>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        if self.entries.len() == LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .entries
            .iter()
            .skip(self.entries.len().saturating_sub(visible))
            .map(|entry| {
                let color = if entry.starts_with("Data quality") {
                    Color::Yellow
                } else {
                    Color::Gray
                };
                Line::styled(format!(" {entry}"), Style::default().fg(color))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(border());
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
