use std::time::Duration;

use crossterm::style::{Color, Stylize};
use url::Url;

/// Success-rate thresholds for the status marker and grade.
const EXCELLENT_RATE: f64 = 90.0;
const GOOD_RATE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Grade {
    Excellent,
    Good,
    Poor,
}

impl Grade {
    pub(crate) fn from_rate(success_rate: f64) -> Self {
        if success_rate >= EXCELLENT_RATE {
            Grade::Excellent
        } else if success_rate >= GOOD_RATE {
            Grade::Good
        } else {
            Grade::Poor
        }
    }

    pub(crate) const fn marker(self) -> &'static str {
        match self {
            Grade::Excellent => "OK",
            Grade::Good => "WARN",
            Grade::Poor => "FAIL",
        }
    }

    pub(crate) const fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Poor => "poor",
        }
    }

    pub(crate) const fn color(self) -> Color {
        match self {
            Grade::Excellent => Color::Green,
            Grade::Good => Color::Yellow,
            Grade::Poor => Color::Red,
        }
    }
}

pub(crate) fn paint(text: &str, color: Color, no_color: bool) -> String {
    if no_color {
        text.to_owned()
    } else {
        text.with(color).to_string()
    }
}

pub(crate) fn millis(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

pub(crate) fn percent(rate: f64) -> String {
    format!("{:.1}%", rate)
}

/// Cuts `text` to `max` characters, marking the cut with "...".
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Host (and port) part of a route URL, or the URL itself when it does not parse.
pub(crate) fn server(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed.host_str().map(|host| match parsed.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_owned(),
            })
        })
        .unwrap_or_else(|| url.to_owned())
}
