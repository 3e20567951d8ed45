//! Values used when neither the config file nor the CLI sets a field.
use std::time::Duration;

use crate::args::StrategyKind;

use super::types::{ConcurrentConfig, ConfigFile, DurationValue, RouteEntry};

pub const DEFAULT_CONFIG_PATH: &str = "routebench.toml";

pub(super) const TIMEOUT: Duration = Duration::from_secs(30);
pub(super) const TEST_COUNT: usize = 10;
pub(super) const DELAY_BETWEEN_TESTS: Duration = Duration::from_millis(200);
pub(super) const MODEL: &str = "claude-3-5-haiku-20241022";
pub(super) const CONTENT: &str = "Hello";
pub(super) const MAX_TOKENS: u32 = 1024;
pub(super) const MAX_CONCURRENT_ROUTES: usize = 3;
pub(super) const MAX_CONCURRENT_PER_ROUTE: usize = 5;
pub(super) const STRATEGY: StrategyKind = StrategyKind::Cooperative;
pub(super) const CONNECTION_POOL_SIZE: usize = 100;

/// Routes written into a freshly created config file: (name, url, description).
pub(super) const SAMPLE_ROUTES: [(&str, &str, &str); 2] = [
    ("main", "https://api.example.com/v1/messages", "Main"),
    ("cdn", "https://cdn.example.com/v1/messages", "CDN"),
];

/// Content of a freshly created config file: every default spelled out plus
/// the sample routes.
pub(super) fn sample_config() -> ConfigFile {
    ConfigFile {
        timeout: Some(DurationValue::Seconds(TIMEOUT.as_secs())),
        test_count: Some(TEST_COUNT),
        delay_between_tests: Some(DurationValue::Text(format!(
            "{}ms",
            DELAY_BETWEEN_TESTS.as_millis()
        ))),
        model: Some(MODEL.to_owned()),
        content: Some(CONTENT.to_owned()),
        max_tokens: Some(MAX_TOKENS),
        concurrent: Some(ConcurrentConfig {
            max_concurrent_routes: Some(MAX_CONCURRENT_ROUTES),
            max_concurrent_per_route: Some(MAX_CONCURRENT_PER_ROUTE),
            strategy: Some(STRATEGY),
            use_async: None,
            connection_pool_size: Some(CONNECTION_POOL_SIZE),
        }),
        routes: SAMPLE_ROUTES
            .iter()
            .map(|(name, url, description)| RouteEntry {
                name: (*name).to_owned(),
                url: (*url).to_owned(),
                description: (*description).to_owned(),
                enabled: true,
            })
            .collect(),
    }
}
