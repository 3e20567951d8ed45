use std::collections::BTreeMap;

use crossterm::style::Color;

use crate::probe::RouteResult;
use crate::stats::summarize;

use super::RunReport;
use super::format::{Grade, millis, paint, percent, server, truncate};

/// Description length shown in the recommendation block.
const RECOMMENDATION_DESCRIPTION_CHARS: usize = 25;

/// One line for a finished route, printed while the run is still going.
#[must_use]
pub fn route_line(result: &RouteResult, no_color: bool) -> String {
    let summary = summarize(result);
    let name = format!("{:<12}", truncate(result.name(), 12));
    if summary.timed_out {
        return format!(
            "  {:<4} {}: {}",
            Grade::Poor.marker(),
            name,
            paint("failed", Color::Red, no_color)
        );
    }
    let grade = Grade::from_rate(summary.success_rate);
    format!(
        "  {:<4} {}: success {}, first byte {}, total {}, concurrency {:>2}",
        paint(grade.marker(), grade.color(), no_color),
        name,
        paint(&format!("{:>6}", percent(summary.success_rate)), Color::Green, no_color),
        paint(&format!("{:>7}", millis(summary.first_byte.mean)), Color::Cyan, no_color),
        paint(&format!("{:>7}", millis(summary.total.mean)), Color::Blue, no_color),
        summary.concurrency_observed
    )
}

/// Final text report: ranked table, concurrency panel, failures,
/// recommendation, and elapsed time.
#[must_use]
pub fn report_lines(report: &RunReport<'_>, no_color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if report.results.is_empty() {
        lines.push("No route results.".to_owned());
        return lines;
    }

    lines.push(paint("Route results", Color::Magenta, no_color));
    lines.push(format!(
        "{:<13} {:<29} {:>8} {:>10} {:>10} {:>6}  {}",
        "Route", "Server", "Success", "FirstByte", "Total", "Conc.", "Grade"
    ));
    for result in &report.ranking.ordered {
        let summary = summarize(result);
        let grade = Grade::from_rate(summary.success_rate);
        let (first_byte, total) = if summary.timed_out {
            ("timeout".to_owned(), "timeout".to_owned())
        } else {
            (millis(summary.first_byte.mean), millis(summary.total.mean))
        };
        lines.push(format!(
            "{:<13} {:<29} {} {:>10} {:>10} {:>6}  {}",
            truncate(result.name(), 13),
            truncate(&server(&result.route().url), 29),
            paint(&format!("{:>8}", percent(summary.success_rate)), grade.color(), no_color),
            first_byte,
            total,
            summary.concurrency_observed,
            paint(grade.label(), grade.color(), no_color)
        ));
    }

    let total_workers: usize = report
        .results
        .iter()
        .map(|result| result.workers().len())
        .sum();
    let route_count = u32::try_from(report.results.len()).map_or(f64::from(u32::MAX), f64::from);
    let workers = u32::try_from(total_workers).map_or(f64::from(u32::MAX), f64::from);
    lines.push(String::new());
    lines.push(paint("Concurrency", Color::Yellow, no_color));
    lines.push(format!("  Strategy:              {}", report.strategy.as_str()));
    lines.push(format!("  Observed workers:      {}", total_workers));
    lines.push(format!(
        "  Avg workers per route: {:.1}",
        workers / route_count
    ));
    lines.push(format!("  Route concurrency:     {}", report.max_concurrent_routes));
    lines.push(format!(
        "  Per-route concurrency: {}",
        report.max_concurrent_per_route
    ));

    let failures = failure_lines(report);
    if !failures.is_empty() {
        lines.push(String::new());
        lines.push(paint("Failures", Color::Red, no_color));
        lines.extend(failures);
    }

    lines.push(String::new());
    match report.ranking.best {
        Some(best) => {
            let summary = summarize(best);
            lines.push(paint("Recommended route", Color::Green, no_color));
            lines.push(format!("  {}", best.name()));
            lines.push(format!("  First byte:  {}", millis(summary.first_byte.mean)));
            lines.push(format!("  Total:       {}", millis(summary.total.mean)));
            lines.push(format!("  Success:     {}", percent(summary.success_rate)));
            lines.push(format!("  Concurrency: {}", summary.concurrency_observed));
            lines.push(format!(
                "  Description: {}",
                best.route()
                    .description
                    .chars()
                    .take(RECOMMENDATION_DESCRIPTION_CHARS)
                    .collect::<String>()
            ));
        }
        None => lines.push(paint(
            "No route succeeded; nothing to recommend.",
            Color::Red,
            no_color,
        )),
    }

    lines.push(String::new());
    lines.push(format!(
        "Finished in {:.1}s",
        report.elapsed.as_secs_f64()
    ));
    lines
}

/// Distinct error messages per route with their counts, in display order.
fn failure_lines(report: &RunReport<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    for result in &report.ranking.ordered {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for error in result.errors() {
            let count = counts.entry(error.as_str()).or_insert(0);
            *count = count.saturating_add(1);
        }
        for (message, count) in counts {
            lines.push(format!("  {}: {}x {}", result.name(), count, message));
        }
    }
    lines
}

pub fn print_report(report: &RunReport<'_>, no_color: bool) {
    println!();
    for line in report_lines(report, no_color) {
        println!("{}", line);
    }
}
