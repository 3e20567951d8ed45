//! Configuration loading and validation.
mod defaults;
mod loader;
mod parse;
mod resolve;
pub mod types;


pub use defaults::DEFAULT_CONFIG_PATH;
pub use loader::{LoadedConfig, load_config, load_config_file, write_default_config};
pub use resolve::{RunConfig, resolve_run_config};
