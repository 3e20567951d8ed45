//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;


pub use cli::BenchArgs;
pub use types::{OutputFormat, PositiveUsize, StrategyKind};

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("routebench/", env!("CARGO_PKG_VERSION"));
