use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::args::StrategyKind;

/// On-disk configuration. Every field is optional; missing values fall back to
/// the defaults when the file is resolved into a `RunConfig`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<DurationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_count: Option<usize>,
    #[serde(alias = "delay", skip_serializing_if = "Option::is_none")]
    pub delay_between_tests: Option<DurationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrent: Option<ConcurrentConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConcurrentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_routes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_per_route: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    /// `true` selects the cooperative strategy, `false` the threaded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_async: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_pool_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    FractionalSeconds(f64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, String> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::FractionalSeconds(secs) => super::parse::fractional_seconds(*secs),
            DurationValue::Text(text) => super::parse::parse_duration_value(text),
        }
    }
}
