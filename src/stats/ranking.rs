use std::cmp::Ordering;
use std::time::Duration;

use crate::probe::RouteResult;

use super::summary::{Statistics, ratio};

const SUCCESS_WEIGHT: f64 = 0.7;
const LATENCY_WEIGHT: f64 = 0.3;
/// Keeps the latency term finite for near-zero first-byte times.
const LATENCY_OFFSET_SECS: f64 = 0.1;

/// Display order plus the recommended route.
#[derive(Debug, Clone)]
pub struct Ranking<'results> {
    pub ordered: Vec<&'results RouteResult>,
    pub best: Option<&'results RouteResult>,
    pub best_score: Option<f64>,
}

/// Scores a route: success ratio weighs 0.7, inverse mean first-byte time
/// (seconds, offset by 0.1) weighs 0.3.
#[must_use]
pub fn score(success_count: usize, test_count: usize, mean_first_byte: Duration) -> f64 {
    let success_ratio = ratio(success_count, test_count);
    let latency = mean_first_byte.as_secs_f64() + LATENCY_OFFSET_SECS;
    success_ratio * SUCCESS_WEIGHT + (1.0 / latency) * LATENCY_WEIGHT
}

/// Orders routes by success count (descending), then mean first-byte time
/// (ascending), and picks the best-scoring route that had any success.
///
/// Ties keep configuration order, both in the display order and for the
/// best route.
#[must_use]
pub fn rank(results: &[RouteResult]) -> Ranking<'_> {
    let mut ordered: Vec<(&RouteResult, Duration)> = results
        .iter()
        .map(|result| (result, sort_latency(result)))
        .collect();
    ordered.sort_by(|(left, left_latency), (right, right_latency)| {
        right
            .success_count()
            .cmp(&left.success_count())
            .then_with(|| left_latency.cmp(right_latency))
    });

    let mut best: Option<(&RouteResult, f64)> = None;
    for (result, _) in &ordered {
        if result.success_count() == 0 {
            continue;
        }
        let mean_first_byte = Statistics::from_samples(result.first_byte_times()).mean;
        let candidate = score(result.success_count(), result.test_count(), mean_first_byte);
        let better = best.is_none_or(|(_, best_score)| {
            candidate.partial_cmp(&best_score) == Some(Ordering::Greater)
        });
        if better {
            best = Some((result, candidate));
        }
    }

    Ranking {
        ordered: ordered.into_iter().map(|(result, _)| result).collect(),
        best: best.map(|(result, _)| result),
        best_score: best.map(|(_, best_score)| best_score),
    }
}

fn sort_latency(result: &RouteResult) -> Duration {
    if result.success_count() == 0 {
        return Duration::MAX;
    }
    Statistics::from_samples(result.first_byte_times()).mean
}
