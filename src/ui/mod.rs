//! Progress display for a pipeline run
//!
//! The pipeline reports through the [`Ui`] trait:
//! - [`UiApp`] draws a ratatui dashboard (phase, per-file counters, table
//!   load gauge, activity)
//! - [`LogUi`] forwards events to `tracing` for plain terminal runs
//! - [`SilentUi`] discards everything (tests)

mod components;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;

use crate::report::FileStats;
use components::{ActivityPanel, FilesPanel, LoadGauge, PhasePanel};

/// Pipeline phases, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Extracting,
    Cleaning,
    Loading,
    Reporting,
    Complete,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Connecting,
        Phase::Extracting,
        Phase::Cleaning,
        Phase::Loading,
        Phase::Reporting,
        Phase::Complete,
    ];

    /// 1-based position of the phase in a run
    pub fn step(self) -> usize {
        Phase::ALL.iter().position(|p| *p == self).unwrap_or(0) + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Connecting => "Connecting to store",
            Phase::Extracting => "Reading source files",
            Phase::Cleaning => "Cleaning records",
            Phase::Loading => "Loading tables",
            Phase::Reporting => "Writing report",
            Phase::Complete => "Complete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rows written so far into the table being loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProgress {
    pub table: String,
    pub written: u64,
    pub total: u64,
}

impl TableProgress {
    pub fn ratio(&self) -> f64 {
        match self.total {
            0 => 1.0,
            total => (self.written as f64 / total as f64).min(1.0),
        }
    }
}

/// Events emitted by the pipeline while it runs
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);

    /// Store the run writes into
    fn set_target(&mut self, target: &str);

    /// Counters for one source file once cleaning is done
    fn file_cleaned(&mut self, file: &str, stats: &FileStats);

    fn rows_written(&mut self, table: &str, written: u64, total: u64);

    fn table_loaded(&mut self, table: &str, rows: u64);

    fn log(&mut self, message: impl Into<String>);
}

/// Full-screen dashboard. Restores the terminal when dropped.
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    phase: PhasePanel,
    files: FilesPanel,
    gauge: LoadGauge,
    activity: ActivityPanel,
}

impl UiApp {
    /// Switch to the alternate screen and draw the empty dashboard
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;

        let mut app = Self {
            terminal: Terminal::new(CrosstermBackend::new(stdout))?,
            phase: PhasePanel::default(),
            files: FilesPanel::default(),
            gauge: LoadGauge::default(),
            activity: ActivityPanel::with_capacity(200),
        };
        app.redraw();
        Ok(app)
    }

    fn redraw(&mut self) {
        let Self {
            terminal,
            phase,
            files,
            gauge,
            activity,
        } = self;

        // A failed frame is not worth aborting the load for
        let _ = terminal.draw(|frame| {
            let [top, table, bar, rest] = Layout::vertical([
                Constraint::Length(5),
                Constraint::Length(files.height()),
                Constraint::Length(3),
                Constraint::Min(4),
            ])
            .areas(frame.area());

            phase.render(frame, top);
            files.render(frame, table);
            gauge.render(frame, bar);
            activity.render(frame, rest);
        });
    }

    /// Put the rendered report in the activity panel and block until the
    /// user dismisses the screen (q, Enter, Esc or Ctrl-C)
    pub fn finish(mut self, report_text: &str) -> Result<()> {
        self.phase.set(Phase::Complete);
        self.gauge.clear();
        report_text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .for_each(|l| self.activity.push(l));
        self.activity.push("Press q or Enter to exit");
        self.redraw();

        loop {
            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let ctrl_c = key.code == KeyCode::Char('c')
                && key.modifiers.contains(KeyModifiers::CONTROL);
            if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Enter | KeyCode::Esc) {
                return Ok(());
            }
        }
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.phase.set(phase);
        if phase != Phase::Loading {
            self.gauge.clear();
        }
        self.redraw();
    }

    fn set_target(&mut self, target: &str) {
        self.phase.set_target(target);
        self.redraw();
    }

    fn file_cleaned(&mut self, file: &str, stats: &FileStats) {
        self.files.upsert(file, stats);
        self.redraw();
    }

    fn rows_written(&mut self, table: &str, written: u64, total: u64) {
        self.gauge.update(TableProgress {
            table: table.to_string(),
            written,
            total,
        });
        self.redraw();
    }

    fn table_loaded(&mut self, table: &str, rows: u64) {
        self.activity.push(format!("{}: {} rows loaded", table, rows));
        self.redraw();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.activity.push(message);
        self.redraw();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = self.terminal.backend_mut().execute(LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Sends pipeline events to the `tracing` subscriber
#[derive(Debug, Default)]
pub struct LogUi;

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        tracing::info!(step = phase.step(), "{}", phase);
    }

    fn set_target(&mut self, target: &str) {
        tracing::info!(target_store = target, "using store");
    }

    fn file_cleaned(&mut self, file: &str, stats: &FileStats) {
        tracing::info!(
            file,
            read = stats.records_read,
            dropped = stats.rows_dropped(),
            duplicates = stats.duplicates_removed,
            filled = stats.values_filled,
            "file cleaned"
        );
    }

    fn rows_written(&mut self, table: &str, written: u64, total: u64) {
        tracing::trace!(table, written, total, "writing");
    }

    fn table_loaded(&mut self, table: &str, rows: u64) {
        tracing::info!(table, rows, "table loaded");
    }

    fn log(&mut self, message: impl Into<String>) {
        tracing::info!("{}", message.into());
    }
}

/// Discards every event
#[derive(Debug, Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _: Phase) {}
    fn set_target(&mut self, _: &str) {}
    fn file_cleaned(&mut self, _: &str, _: &FileStats) {}
    fn rows_written(&mut self, _: &str, _: u64, _: u64) {}
    fn table_loaded(&mut self, _: &str, _: u64) {}
    fn log(&mut self, _: impl Into<String>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_steps() {
        assert_eq!(Phase::Connecting.step(), 1);
        assert_eq!(Phase::Loading.step(), 4);
        assert_eq!(Phase::Complete.step(), Phase::ALL.len());
        assert_eq!(Phase::Reporting.to_string(), "Writing report");
    }

    #[test]
    fn test_table_progress_ratio() {
        let progress = |written, total| TableProgress {
            table: "orders".into(),
            written,
            total,
        };
        assert_eq!(progress(0, 0).ratio(), 1.0);
        assert_eq!(progress(1, 4).ratio(), 0.25);
        assert_eq!(progress(9, 4).ratio(), 1.0);
    }
}
