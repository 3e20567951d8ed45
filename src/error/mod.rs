mod app;
mod config;
mod job;
mod probe;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use job::JobError;
pub use probe::ProbeError;
pub use validation::ValidationError;
