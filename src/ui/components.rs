//! Widgets drawn by [`super::UiApp`]

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Phase, TableProgress};
use crate::report::FileStats;

fn frame_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Blue))
}

/// Step counter, phase name and the store being written
pub struct PhasePanel {
    phase: Phase,
    target: String,
}

impl Default for PhasePanel {
    fn default() -> Self {
        Self {
            phase: Phase::Connecting,
            target: String::new(),
        }
    }
}

impl PhasePanel {
    pub fn set(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_target(&mut self, target: &str) {
        self.target = target.to_string();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let done = self.phase == Phase::Complete;
        let style = Style::default()
            .fg(if done { Color::Green } else { Color::Cyan })
            .add_modifier(Modifier::BOLD);

        let text = vec![
            Line::from(Span::styled(
                format!(" [{}/{}] {}", self.phase.step(), Phase::ALL.len(), self.phase),
                style,
            )),
            Line::default(),
            Line::styled(format!(" store: {}", self.target), Style::default().fg(Color::Gray)),
        ];

        frame.render_widget(Paragraph::new(text).block(frame_block(" FlexiMart ETL ")), area);
    }
}

/// One row of counters per source file, in the order files were cleaned
#[derive(Default)]
pub struct FilesPanel {
    rows: Vec<(String, FileStats)>,
}

impl FilesPanel {
    pub fn upsert(&mut self, file: &str, stats: &FileStats) {
        match self.rows.iter_mut().find(|(name, _)| name == file) {
            Some((_, existing)) => *existing = stats.clone(),
            None => self.rows.push((file.to_string(), stats.clone())),
        }
    }

    /// Borders, header and one line per file (at least three)
    pub fn height(&self) -> u16 {
        3 + self.rows.len().max(3) as u16
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["File", "Read", "Dropped", "Duplicates", "Filled"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.rows.iter().map(|(file, stats)| {
            let dropped = stats.rows_dropped();
            Row::new(vec![
                Cell::from(file.as_str()),
                Cell::from(stats.records_read.to_string()),
                Cell::from(dropped.to_string()).style(if dropped > 0 {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                }),
                Cell::from(stats.duplicates_removed.to_string()),
                Cell::from(stats.values_filled.to_string()),
            ])
        });

        let widths = [
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Length(8),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(frame_block(" Source files "));

        frame.render_widget(table, area);
    }
}

/// Gauge for the table currently being written
#[derive(Default)]
pub struct LoadGauge {
    current: Option<TableProgress>,
}

impl LoadGauge {
    pub fn update(&mut self, progress: TableProgress) {
        self.current = Some(progress);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = frame_block(" Load ");
        match &self.current {
            Some(progress) => {
                let gauge = Gauge::default()
                    .block(block)
                    .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
                    .ratio(progress.ratio())
                    .label(format!(
                        "{}: {}/{}",
                        progress.table, progress.written, progress.total
                    ));
                frame.render_widget(gauge, area);
            }
            None => frame.render_widget(block, area),
        }
    }
}

/// Bounded list of recent messages, newest at the bottom
pub struct ActivityPanel {
    lines: VecDeque<String>,
    capacity: usize,
}

impl ActivityPanel {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.lines.len().saturating_sub(visible);
        let last = self.lines.len().saturating_sub(1);

        let items: Vec<ListItem> = self
            .lines
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, line)| {
                let color = if i == last { Color::White } else { Color::DarkGray };
                ListItem::new(format!(" {}", line)).style(Style::default().fg(color))
            })
            .collect();

        frame.render_widget(List::new(items).block(frame_block(" Activity ")), area);
    }
}
