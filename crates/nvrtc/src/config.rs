//! # Configuration
//!
//! Figment-based configuration with layered support:
//! 1. Compiled defaults
//! 2. Configuration file (TOML)
//! 3. Environment variable overrides (`NVRTC_*`)

use crate::error::ConfigurationError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default configuration file name, looked up in the current directory
const DEFAULT_CONFIG_FILE: &str = "nvrtc.toml";

/// Environment variable prefix
const DEFAULT_ENV_PREFIX: &str = "NVRTC";

/// Environment variable naming an explicit configuration file
const CONFIG_PATH_VAR: &str = "NVRTC_CONFIG_PATH";

/// Program name the native library substitutes for a NULL name
pub const DEFAULT_PROGRAM_NAME: &str = "default_program";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvrtcConfig {
    /// Explicit library file; the platform candidate list is used when unset
    pub library_path: Option<PathBuf>,
    /// Name given to programs created without one
    pub program_name: String,
    /// Options passed ahead of per-request options on every compile
    pub default_options: Vec<String>,
    pub log_level: String,
}

impl Default for NvrtcConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
            default_options: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl NvrtcConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.program_name.is_empty() {
            return Err(ConfigurationError::InvalidValue {
                key: "program_name".to_string(),
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigurationError::InvalidValue {
                key: "log_level".to_string(),
                value: self.log_level.clone(),
                reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }
}

/// Configuration loading options
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Optional path to configuration file
    pub config_path: Option<PathBuf>,
    /// Environment variable prefix
    pub env_prefix: String,
    /// Whether configuration file is required
    pub require_file: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            require_file: false,
        }
    }
}

/// Load configuration from defaults, `nvrtc.toml` (if present) and the
/// environment.
pub fn load_config() -> Result<NvrtcConfig, ConfigurationError> {
    load_config_with_options(LoadOptions::default())
}

/// Load configuration from a specific file with environment overrides.
pub fn load_from_file(path: &Path) -> Result<NvrtcConfig, ConfigurationError> {
    load_config_with_options(LoadOptions {
        config_path: Some(path.to_path_buf()),
        require_file: true,
        ..LoadOptions::default()
    })
}

pub fn load_config_with_options(options: LoadOptions) -> Result<NvrtcConfig, ConfigurationError> {
    debug!("Loading configuration with options: {:?}", options);

    let mut figment = Figment::new().merge(Serialized::defaults(NvrtcConfig::default()));

    if let Some(path) = determine_config_path(options.config_path) {
        if path.exists() {
            info!("Loading configuration from file: {}", path.display());
            figment = add_file_provider(figment, &path)?;
        } else if options.require_file {
            return Err(ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            });
        } else {
            warn!(
                "Configuration file not found: {} (using defaults)",
                path.display()
            );
        }
    }

    figment = figment.merge(
        Env::prefixed(&format!("{}_", options.env_prefix))
            .ignore(&["CONFIG_PATH"])
            .split("__"),
    );

    let config: NvrtcConfig = figment
        .extract()
        .map_err(|err| ConfigurationError::ParseError {
            details: format!("Failed to parse configuration: {err}"),
        })?;
    config.validate()?;

    debug!("Configuration loaded: {:?}", config);
    Ok(config)
}

fn determine_config_path(override_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(env_path);
        debug!("Using config path from environment: {}", path.display());
        return Some(path);
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    debug!("No configuration file found, using defaults");
    None
}

fn add_file_provider(figment: Figment, path: &Path) -> Result<Figment, ConfigurationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("toml");

    match extension.to_lowercase().as_str() {
        "toml" => Ok(figment.merge(Toml::file(path))),
        _ => Err(ConfigurationError::ParseError {
            details: format!(
                "Unsupported configuration file format: {extension} (supported: toml)"
            ),
        }),
    }
}
