use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AppError, AppResult, ConfigError};

use super::defaults::{DEFAULT_CONFIG_PATH, sample_config};
use super::types::ConfigFile;

/// A parsed config file and where it came from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub file: ConfigFile,
    /// The default file did not exist and was written before loading.
    pub created: bool,
}

/// Loads the config at `path`, or `routebench.toml` in the working directory.
///
/// A missing default file is created with sample content first; an explicit
/// path must exist.
///
/// # Errors
///
/// Returns an error when the config file cannot be written, read, or parsed.
pub fn load_config(path: Option<&Path>) -> AppResult<LoadedConfig> {
    if let Some(path) = path {
        return Ok(LoadedConfig {
            path: path.to_path_buf(),
            file: load_config_file(path)?,
            created: false,
        });
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let created = !path.exists();
    if created {
        info!("Config {} not found, writing defaults", path.display());
        write_default_config(&path)?;
    }
    Ok(LoadedConfig {
        file: load_config_file(&path)?,
        path,
        created,
    })
}

/// Writes the sample configuration to `path` as TOML.
///
/// # Errors
///
/// Returns an error when serialization or the write fails.
pub fn write_default_config(path: &Path) -> AppResult<()> {
    let content = toml::to_string_pretty(&sample_config())?;
    std::fs::write(path, content).map_err(|err| {
        AppError::config(ConfigError::WriteDefaultConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })
}

/// Parses a config file, choosing TOML or JSON by extension.
///
/// # Errors
///
/// Returns an error when the file cannot be read, has an unsupported
/// extension, or does not parse.
pub fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
