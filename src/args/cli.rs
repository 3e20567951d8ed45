use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use super::parsers::{parse_delay_arg, parse_duration_arg, parse_positive_usize};
use super::types::{OutputFormat, PositiveUsize, StrategyKind};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Probe streaming chat-completion routes under bounded concurrency and recommend the fastest one."
)]
pub struct BenchArgs {
    /// Path to config file (TOML or JSON); defaults to ./routebench.toml, created if missing
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// API token sent verbatim in the Authorization header (must start with sk-)
    #[arg(long, env = "ROUTEBENCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Probes per route
    #[arg(long = "test-count", short = 'n', value_parser = parse_positive_usize)]
    pub test_count: Option<PositiveUsize>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long, short = 't', value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Pause after each probe before its slot is released (supports ms/s/m/h, 0 disables)
    #[arg(long, value_parser = parse_delay_arg)]
    pub delay: Option<Duration>,

    /// Routes probed at the same time
    #[arg(long = "max-concurrent-routes", value_parser = parse_positive_usize)]
    pub max_concurrent_routes: Option<PositiveUsize>,

    /// Probes in flight per route
    #[arg(long = "max-concurrent-per-route", value_parser = parse_positive_usize)]
    pub max_concurrent_per_route: Option<PositiveUsize>,

    /// Execution strategy for probes and routes
    #[arg(long, value_enum, ignore_case = true)]
    pub strategy: Option<StrategyKind>,

    /// Only probe the named route (repeatable)
    #[arg(long = "route")]
    pub routes: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Report format
    #[arg(long = "output-format", value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by ROUTEBENCH_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
