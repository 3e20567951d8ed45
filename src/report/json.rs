use serde_json::{Value, json};

use crate::error::AppResult;
use crate::stats::{Statistics, summarize};

use super::RunReport;

fn statistics_json(stats: &Statistics) -> Value {
    json!({
        "mean_ms": stats.mean.as_secs_f64() * 1000.0,
        "min_ms": stats.min.as_secs_f64() * 1000.0,
        "max_ms": stats.max.as_secs_f64() * 1000.0,
        "median_ms": stats.median.as_secs_f64() * 1000.0
    })
}

/// Machine-readable report: route summaries in display order, the
/// recommended route (or null), and the elapsed run time.
#[must_use]
pub fn report_json(report: &RunReport<'_>) -> Value {
    let routes: Vec<Value> = report
        .ranking
        .ordered
        .iter()
        .map(|result| {
            let summary = summarize(result);
            json!({
                "name": result.name(),
                "url": result.route().url,
                "description": result.route().description,
                "test_count": result.test_count(),
                "success_count": result.success_count(),
                "fail_count": result.fail_count(),
                "success_rate": summary.success_rate,
                "timed_out": summary.timed_out,
                "concurrency_observed": summary.concurrency_observed,
                "first_byte": statistics_json(&summary.first_byte),
                "total": statistics_json(&summary.total),
                "errors": result.errors()
            })
        })
        .collect();

    json!({
        "strategy": report.strategy,
        "max_concurrent_routes": report.max_concurrent_routes,
        "max_concurrent_per_route": report.max_concurrent_per_route,
        "routes": routes,
        "best_route": report.ranking.best.map(|best| best.name()),
        "best_score": report.ranking.best_score,
        "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX)
    })
}

/// Prints the JSON report to stdout.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn print_json(report: &RunReport<'_>) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(&report_json(report))?;
    println!("{}", rendered);
    Ok(())
}
