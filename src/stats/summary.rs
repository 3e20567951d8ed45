use std::time::Duration;

use crate::probe::RouteResult;

/// Location and spread of a latency sample. All zero for an empty sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
    pub median: Duration,
}

impl Statistics {
    #[must_use]
    pub fn from_samples(samples: &[Duration]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let (Some(min), Some(max)) = (sorted.first().copied(), sorted.last().copied()) else {
            return Self::default();
        };
        Self {
            mean: mean(&sorted),
            min,
            max,
            median: median(&sorted),
        }
    }
}

fn mean(samples: &[Duration]) -> Duration {
    let count = u128::try_from(samples.len()).unwrap_or(u128::MAX);
    let sum: u128 = samples
        .iter()
        .fold(0_u128, |acc, sample| acc.saturating_add(sample.as_nanos()));
    nanos_to_duration(sum.checked_div(count).unwrap_or(0))
}

fn median(sorted: &[Duration]) -> Duration {
    let mid = sorted.len().checked_div(2).unwrap_or(0);
    let upper = sorted.get(mid).copied().unwrap_or_default();
    if sorted.len() % 2 == 0 {
        let lower = mid
            .checked_sub(1)
            .and_then(|index| sorted.get(index))
            .copied()
            .unwrap_or(upper);
        let sum = lower.as_nanos().saturating_add(upper.as_nanos());
        nanos_to_duration(sum.checked_div(2).unwrap_or(0))
    } else {
        upper
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Display-ready view of one finished route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub success_rate: f64,
    pub concurrency_observed: usize,
    pub first_byte: Statistics,
    pub total: Statistics,
    /// No probe succeeded; renderers show "timeout" instead of latencies.
    pub timed_out: bool,
}

/// Reduces a route's raw outcomes. Latency statistics only cover
/// successful probes.
#[must_use]
pub fn summarize(result: &RouteResult) -> RouteSummary {
    RouteSummary {
        success_rate: success_rate(result.success_count(), result.test_count()),
        concurrency_observed: result.workers().len(),
        first_byte: Statistics::from_samples(result.first_byte_times()),
        total: Statistics::from_samples(result.total_times()),
        timed_out: result.success_count() == 0,
    }
}

pub(crate) fn success_rate(success_count: usize, test_count: usize) -> f64 {
    if test_count == 0 {
        return 0.0;
    }
    ratio(success_count, test_count) * 100.0
}

pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    let numerator = u32::try_from(numerator).map_or(f64::from(u32::MAX), f64::from);
    let denominator = u32::try_from(denominator).map_or(f64::from(u32::MAX), f64::from);
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
