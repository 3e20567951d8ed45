use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use crate::args::StrategyKind;
use crate::config::RunConfig;
use crate::error::AppResult;

use super::format::{server, truncate};

/// Rough upper bound on how long a run takes, shown before asking to continue.
///
/// Cooperative: `timeout * batches + delay * 2 * timeout * batches`, with
/// `batches = ceil(routes / max_concurrent_routes)`.
/// Threaded: `total_probes * delay / max_concurrent_per_route / max_concurrent_routes`.
#[must_use]
pub fn estimated_runtime(run: &RunConfig) -> Duration {
    let timeout = run.timeout.as_secs_f64();
    let delay = run.delay_between_tests.as_secs_f64();
    let secs = match run.strategy {
        StrategyKind::Cooperative => {
            let batches = run.routes.len().div_ceil(run.max_concurrent_routes.max(1));
            let batches = as_f64(batches);
            timeout * batches + delay * 2.0 * timeout * batches
        }
        StrategyKind::Threaded => {
            as_f64(run.total_probes()) * delay
                / as_f64(run.max_concurrent_per_route.max(1))
                / as_f64(run.max_concurrent_routes.max(1))
        }
    };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn as_f64(value: usize) -> f64 {
    u32::try_from(value).map_or(f64::from(u32::MAX), f64::from)
}

/// Settings overview and route list printed before a run.
#[must_use]
pub fn plan_lines(run: &RunConfig, config_path: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Config: {}", config_path.display()));
    lines.push(format!("Probes per route: {}", run.test_count));
    lines.push(format!("Route concurrency: {}", run.max_concurrent_routes));
    lines.push(format!("Per-route concurrency: {}", run.max_concurrent_per_route));
    lines.push(format!("Strategy: {}", run.strategy.as_str()));
    lines.push(format!("Delay: {}ms", run.delay_between_tests.as_millis()));
    lines.push(format!("Timeout: {}s", run.timeout.as_secs()));
    lines.push("Routes:".to_owned());
    for (index, route) in run.routes.iter().enumerate() {
        lines.push(format!(
            "  {:>2}. {:<16} {:<35} {}",
            index.saturating_add(1),
            truncate(&route.name, 14),
            truncate(&server(&route.url), 33),
            truncate(&route.description, 18)
        ));
    }
    let minutes = estimated_runtime(run).as_secs_f64() / 60.0;
    lines.push(format!(
        "Probing {} route(s), {} probe(s) each: {} total, estimated at most {:.1} min",
        run.routes.len(),
        run.test_count,
        run.total_probes(),
        minutes
    ));
    lines
}

/// Asks `Continue? [y/N]`; only an explicit yes proceeds.
///
/// # Errors
///
/// Returns an error when writing the prompt or reading the answer fails.
pub fn confirm<R, W>(input: &mut R, output: &mut W) -> AppResult<bool>
where
    R: BufRead,
    W: Write,
{
    write!(output, "Continue? [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
