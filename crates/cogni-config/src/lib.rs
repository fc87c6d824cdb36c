// crates/cogni-config/src/lib.rs
// ============================================================================
// Crate: cogni-config
// Description: Service-level configuration for the embedding process.
// Purpose: Resolve `APP_ENV` and `LOG_LEVEL` from an optional TOML file with
//          an environment-variable overlay into a typed, validated
//          `ServiceConfig`, fail-closed on malformed input.
// Dependencies: cogni-core, toml
// ============================================================================

//! ## Overview
//! `cogni-core` never calls `std::env::var` itself — every ambient setting it
//! needs (the provenance environment tag, the minimum log level) is passed
//! in by the embedder. `cogni-config::ServiceConfig` is that embedder's
//! single place to resolve those settings, so the rest of the crate stays
//! testable without environment mutation.
//!
//! Resolution order, low to high precedence: built-in defaults (`dev`,
//! `info`), an optional TOML file, then `APP_ENV`/`LOG_LEVEL` environment
//! variables. A value that is present but unrecognized — in the file or the
//! environment — fails closed rather than silently falling back, since a
//! typo (`APP_ENV=prod ` with a trailing space, wrong casing) should not
//! silently downgrade a production deployment to dev behavior. A missing
//! config file is not an error; an explicitly named file that cannot be
//! read is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use cogni_core::Environment;
use cogni_core::LogLevel;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the provenance environment tag.
pub const APP_ENV_VAR: &str = "APP_ENV";
/// Environment variable selecting the minimum log level.
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
/// Environment variable overriding the config file path.
pub const CONFIG_PATH_VAR: &str = "COGNI_CONFIG";
/// Config filename resolved in the current directory when no override is set.
const DEFAULT_CONFIG_NAME: &str = "cogni.toml";
/// Maximum accepted config file size.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;

// ============================================================================
// SECTION: Configuration Type
// ============================================================================

/// Resolved service configuration, threaded into `cogni-gates` (as the
/// `Environment` tag on `ProviderResult.provenance`) and `cogni-core::log`
/// (as the `Logger`'s minimum level) by the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Provenance environment tag for this process.
    pub app_env: Environment,
    /// Minimum level the root logger emits.
    pub log_level: LogLevel,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_env: Environment::Dev,
            log_level: LogLevel::Info,
        }
    }
}

/// Shape of the optional on-disk config file. Both fields are optional so a
/// file may set only one of the two settings.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    app_env: Option<String>,
    log_level: Option<String>,
}

impl ServiceConfig {
    /// Resolves configuration from `APP_ENV`/`LOG_LEVEL`, with no file
    /// overlay. Convenience entry point for embedders that do not ship a
    /// config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `APP_ENV` or `LOG_LEVEL` is set but does
    /// not match a recognized value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overlay(&mut config)?;
        Ok(config)
    }

    /// Resolves configuration from an optional TOML file, overlaid by
    /// `APP_ENV`/`LOG_LEVEL`.
    ///
    /// When `path` is `None`, the path is resolved from `COGNI_CONFIG`, then
    /// `./cogni.toml`; a missing file at the resolved path is not an error.
    /// When `path` is `Some`, a missing file at that path is an error — an
    /// explicit request for a config file implies it must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read (when explicitly
    /// named), exceeds the size limit, fails to parse as TOML, or when any
    /// resolved `app_env`/`log_level` value is unrecognized.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(file_config) = read_file_config(path)? {
            if let Some(value) = &file_config.app_env {
                config.app_env = parse_environment(value)?;
            }
            if let Some(value) = &file_config.log_level {
                config.log_level = parse_log_level(value)?;
            }
        }
        apply_env_overlay(&mut config)?;
        Ok(config)
    }
}

/// Applies `APP_ENV`/`LOG_LEVEL` on top of `config`, in place.
fn apply_env_overlay(config: &mut ServiceConfig) -> Result<(), ConfigError> {
    match env::var(APP_ENV_VAR) {
        Ok(value) => config.app_env = parse_environment(&value)?,
        Err(env::VarError::NotPresent) => {}
        Err(env::VarError::NotUnicode(_)) => {
            return Err(ConfigError::Invalid(format!("{APP_ENV_VAR} is not valid unicode")));
        }
    }
    match env::var(LOG_LEVEL_VAR) {
        Ok(value) => config.log_level = parse_log_level(&value)?,
        Err(env::VarError::NotPresent) => {}
        Err(env::VarError::NotUnicode(_)) => {
            return Err(ConfigError::Invalid(format!("{LOG_LEVEL_VAR} is not valid unicode")));
        }
    }
    Ok(())
}

/// Reads and parses the config file, if one is resolved and present.
fn read_file_config(path: Option<&Path>) -> Result<Option<FileConfig>, ConfigError> {
    let (resolved, explicit) = resolve_config_path(path);
    let bytes = match fs::read(&resolved) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => return Ok(None),
        Err(err) => return Err(ConfigError::Io(format!("{}: {err}", resolved.display()))),
    };
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid(format!("{} exceeds size limit", resolved.display())));
    }
    let content = std::str::from_utf8(&bytes)
        .map_err(|_| ConfigError::Invalid(format!("{} is not valid utf-8", resolved.display())))?;
    let file_config: FileConfig = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
    Ok(Some(file_config))
}

/// Resolves the config file path and whether it was explicitly requested
/// (an explicit path, or `COGNI_CONFIG`, both demand the file exist).
fn resolve_config_path(path: Option<&Path>) -> (PathBuf, bool) {
    if let Some(path) = path {
        return (path.to_path_buf(), true);
    }
    if let Ok(env_path) = env::var(CONFIG_PATH_VAR) {
        return (PathBuf::from(env_path), true);
    }
    (PathBuf::from(DEFAULT_CONFIG_NAME), false)
}

/// Parses an `APP_ENV` value, case-insensitively.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `value` is not one of `dev`,
/// `preview`, or `prod`.
fn parse_environment(value: &str) -> Result<Environment, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "dev" | "development" => Ok(Environment::Dev),
        "preview" | "staging" => Ok(Environment::Preview),
        "prod" | "production" => Ok(Environment::Prod),
        other => Err(ConfigError::Invalid(format!(
            "{APP_ENV_VAR} must be one of dev, preview, prod (got {other:?})"
        ))),
    }
}

/// Parses a `LOG_LEVEL` value, case-insensitively.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `value` is not one of `debug`,
/// `info`, `warn`, or `error`.
fn parse_log_level(value: &str) -> Result<LogLevel, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "debug" | "trace" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => Err(ConfigError::Invalid(format!(
            "{LOG_LEVEL_VAR} must be one of debug, info, warn, error (got {other:?})"
        ))),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The config file content is not valid TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A recognized setting held an unrecognized value, or the file itself
    /// is invalid.
    #[error("invalid config: {0}")]
    Invalid(String),
}
