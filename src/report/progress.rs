use std::io::{IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tracing::{debug, warn};

use crate::probe::{ProbeOutcome, ProgressSink, RouteResult};

use super::summary::route_line;

const BAR_WIDTH: usize = 30;

/// Live console feedback: a redrawn probe counter on stderr (TTY only) and,
/// optionally, one stdout line per finished route.
pub struct ConsoleProgress {
    total: usize,
    completed: Mutex<usize>,
    interactive: bool,
    route_lines: bool,
    no_color: bool,
}

impl ConsoleProgress {
    #[must_use]
    pub fn new(total: usize, route_lines: bool, no_color: bool) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
            interactive: std::io::stderr().is_terminal(),
            route_lines,
            no_color,
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        *self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ends the progress line so later output starts on a fresh line.
    pub fn finish(&self) {
        let _guard = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        if self.interactive && finish_progress_line().is_err() {
            warn!("Failed to finish progress line");
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn probe_finished(&self, route: &str, outcome: &ProbeOutcome) {
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        *completed = completed.saturating_add(1);
        debug!(
            "{} probe {}/{} on {:?}: {}",
            route,
            *completed,
            self.total,
            outcome.worker,
            outcome
                .error()
                .map_or_else(|| "ok".to_owned(), ToString::to_string)
        );
        if self.interactive
            && render_progress_line(*completed, self.total, self.no_color).is_err()
        {
            warn!("Failed to render progress line");
        }
    }

    fn route_finished(&self, result: &RouteResult) {
        let completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.route_lines {
            return;
        }
        if self.interactive && clear_progress_line().is_err() {
            warn!("Failed to clear progress line");
        }
        println!("{}", route_line(result, self.no_color));
        if self.interactive
            && render_progress_line(*completed, self.total, self.no_color).is_err()
        {
            warn!("Failed to render progress line");
        }
    }
}

fn clear_progress_line() -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    out.flush()
}

fn render_progress_line(current: usize, goal: usize, no_color: bool) -> Result<(), std::io::Error> {
    let line = build_progress_line(current, goal, no_color);

    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for segment in line {
        match segment.color {
            Some(color) if !no_color => {
                queue!(
                    out,
                    SetForegroundColor(color),
                    Print(&segment.text),
                    ResetColor
                )?;
            }
            Some(_) | None => queue!(out, Print(&segment.text))?,
        }
    }
    out.flush()
}

fn finish_progress_line() -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    out.write_all(b"\n")?;
    out.flush()
}

pub(super) fn build_progress_line(
    current: usize,
    goal: usize,
    no_color: bool,
) -> Vec<ProgressSegment> {
    let goal = goal.max(1);
    let current = current.min(goal);

    let current_u128 = u128::from(u64::try_from(current).unwrap_or(u64::MAX));
    let size_u128 = u128::from(u64::try_from(BAR_WIDTH).unwrap_or(u64::MAX));
    let goal_u128 = u128::from(u64::try_from(goal).unwrap_or(u64::MAX));

    let scaled = current_u128
        .saturating_mul(size_u128)
        .checked_div(goal_u128)
        .unwrap_or(0);
    let complete_size = usize::try_from(scaled).unwrap_or(BAR_WIDTH).min(BAR_WIDTH);
    let incomplete_size = BAR_WIDTH.saturating_sub(complete_size);

    let percent_x100 = current_u128
        .saturating_mul(10_000)
        .checked_div(goal_u128)
        .unwrap_or(0);
    let percent_whole = percent_x100.checked_div(100).unwrap_or(0);
    let percent_frac = percent_x100.checked_rem(100).unwrap_or(0);
    let percent_text = format!(" {}.{:02}%", percent_whole, percent_frac);
    let count_text = format!(" | {}/{} probes", current, goal);

    let progress_bar = format!(
        "[{}{}]",
        "#".repeat(complete_size),
        "-".repeat(incomplete_size)
    );

    if no_color {
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::plain(percent_text),
            ProgressSegment::plain(count_text),
        ]
    } else {
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::colored(percent_text, Color::Cyan),
            ProgressSegment::colored(count_text, Color::Yellow),
        ]
    }
}

pub(super) struct ProgressSegment {
    pub(super) text: String,
    pub(super) color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}
