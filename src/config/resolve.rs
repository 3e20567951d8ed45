use std::collections::BTreeSet;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::args::{BenchArgs, PositiveUsize, StrategyKind};
use crate::error::{AppError, AppResult, ConfigError};
use crate::probe::{ChatPayload, RouteConfig, RouteSettings};

use super::defaults;
use super::types::{ConcurrentConfig, ConfigFile, DurationValue, RouteEntry};

/// Fully validated settings for one run. CLI values win over the file, the
/// file wins over the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub timeout: Duration,
    pub test_count: usize,
    pub delay_between_tests: Duration,
    pub max_concurrent_routes: usize,
    pub max_concurrent_per_route: usize,
    pub strategy: StrategyKind,
    pub connection_pool_size: usize,
    pub payload: ChatPayload,
    /// Enabled routes in configuration order.
    pub routes: Vec<RouteConfig>,
}

impl RunConfig {
    #[must_use]
    pub fn total_probes(&self) -> usize {
        self.test_count.saturating_mul(self.routes.len())
    }

    #[must_use]
    pub const fn route_settings(&self) -> RouteSettings {
        RouteSettings {
            test_count: self.test_count,
            max_concurrent: self.max_concurrent_per_route,
            delay_between_probes: self.delay_between_tests,
        }
    }
}

/// Merges CLI overrides into the config file and validates the result.
///
/// # Errors
///
/// Returns an error for zero-valued counts, invalid durations, conflicting
/// strategy settings, invalid routes, or a `--route` filter naming an
/// unknown route.
pub fn resolve_run_config(config: &ConfigFile, args: &BenchArgs) -> AppResult<RunConfig> {
    let concurrent = config.concurrent.as_ref();

    let timeout = match args.timeout {
        Some(timeout) => timeout,
        None => match config.timeout.as_ref() {
            Some(value) => positive_duration(value, "timeout")?,
            None => defaults::TIMEOUT,
        },
    };
    let delay_between_tests = match args.delay {
        Some(delay) => delay,
        None => match config.delay_between_tests.as_ref() {
            Some(value) => duration(value, "delay_between_tests")?,
            None => defaults::DELAY_BETWEEN_TESTS,
        },
    };

    let test_count = count(
        args.test_count,
        config.test_count,
        defaults::TEST_COUNT,
        "test_count",
    )?;
    let max_concurrent_routes = count(
        args.max_concurrent_routes,
        concurrent.and_then(|section| section.max_concurrent_routes),
        defaults::MAX_CONCURRENT_ROUTES,
        "max_concurrent_routes",
    )?;
    let max_concurrent_per_route = count(
        args.max_concurrent_per_route,
        concurrent.and_then(|section| section.max_concurrent_per_route),
        defaults::MAX_CONCURRENT_PER_ROUTE,
        "max_concurrent_per_route",
    )?;
    let connection_pool_size = count(
        None,
        concurrent.and_then(|section| section.connection_pool_size),
        defaults::CONNECTION_POOL_SIZE,
        "connection_pool_size",
    )?;

    let strategy = match args.strategy {
        Some(strategy) => strategy,
        None => configured_strategy(concurrent)?,
    };

    let max_tokens = config.max_tokens.unwrap_or(defaults::MAX_TOKENS);
    if max_tokens == 0 {
        return Err(AppError::config(ConfigError::FieldMustBePositive {
            field: "max_tokens",
        }));
    }
    let payload = ChatPayload::user_prompt(
        config.model.as_deref().unwrap_or(defaults::MODEL),
        max_tokens,
        config.content.as_deref().unwrap_or(defaults::CONTENT),
    );

    let routes = select_routes(validate_routes(&config.routes)?, &args.routes)?;
    debug!(
        "Resolved {} route(s), strategy {}",
        routes.len(),
        strategy.as_str()
    );

    Ok(RunConfig {
        timeout,
        test_count,
        delay_between_tests,
        max_concurrent_routes,
        max_concurrent_per_route,
        strategy,
        connection_pool_size,
        payload,
        routes,
    })
}

fn duration(value: &DurationValue, field: &'static str) -> AppResult<Duration> {
    value
        .to_duration()
        .map_err(|message| AppError::config(ConfigError::InvalidDuration { field, message }))
}

fn positive_duration(value: &DurationValue, field: &'static str) -> AppResult<Duration> {
    let parsed = duration(value, field)?;
    if parsed.is_zero() {
        return Err(AppError::config(ConfigError::InvalidDuration {
            field,
            message: "Duration must be > 0.".to_owned(),
        }));
    }
    Ok(parsed)
}

fn count(
    cli: Option<PositiveUsize>,
    file: Option<usize>,
    default: usize,
    field: &'static str,
) -> AppResult<usize> {
    if let Some(value) = cli {
        return Ok(value.get());
    }
    let value = file.unwrap_or(default);
    PositiveUsize::try_from(value)
        .map(PositiveUsize::get)
        .map_err(|_err| AppError::config(ConfigError::FieldMustBePositive { field }))
}

fn configured_strategy(concurrent: Option<&ConcurrentConfig>) -> AppResult<StrategyKind> {
    let Some(section) = concurrent else {
        return Ok(defaults::STRATEGY);
    };
    match (section.strategy, section.use_async) {
        (Some(_), Some(_)) => Err(AppError::config(ConfigError::Conflict {
            left: "strategy",
            right: "use_async",
        })),
        (Some(strategy), None) => Ok(strategy),
        (None, Some(true)) => Ok(StrategyKind::Cooperative),
        (None, Some(false)) => Ok(StrategyKind::Threaded),
        (None, None) => Ok(defaults::STRATEGY),
    }
}

/// Checks every entry and keeps the enabled ones in file order.
fn validate_routes(entries: &[RouteEntry]) -> AppResult<Vec<RouteConfig>> {
    let mut seen = BTreeSet::new();
    let mut routes = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(AppError::config(ConfigError::RouteNameEmpty));
        }
        if !seen.insert(name) {
            return Err(AppError::config(ConfigError::DuplicateRoute {
                name: name.to_owned(),
            }));
        }
        if !entry.enabled {
            debug!("Skipping disabled route {}", name);
            continue;
        }
        let url = entry.url.trim();
        let parsed = Url::parse(url).map_err(|err| {
            AppError::config(ConfigError::InvalidRouteUrl {
                name: name.to_owned(),
                url: url.to_owned(),
                source: err,
            })
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::config(ConfigError::UnsupportedScheme {
                name: name.to_owned(),
                scheme: parsed.scheme().to_owned(),
            }));
        }
        routes.push(RouteConfig {
            name: name.to_owned(),
            url: url.to_owned(),
            description: entry.description.clone(),
        });
    }
    Ok(routes)
}

/// Applies the `--route` filter; an empty filter keeps every route.
fn select_routes(routes: Vec<RouteConfig>, filter: &[String]) -> AppResult<Vec<RouteConfig>> {
    if let Some(unknown) = filter
        .iter()
        .find(|name| !routes.iter().any(|route| &route.name == *name))
    {
        return Err(AppError::config(ConfigError::UnknownRoute {
            name: unknown.clone(),
        }));
    }
    let selected: Vec<RouteConfig> = if filter.is_empty() {
        routes
    } else {
        routes
            .into_iter()
            .filter(|route| filter.contains(&route.name))
            .collect()
    };
    if selected.is_empty() {
        return Err(AppError::config(ConfigError::NoEnabledRoutes));
    }
    Ok(selected)
}
