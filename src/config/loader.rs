//! Configuration loading from disk and the environment.
//!
//! Precedence: schema defaults, then the optional TOML file, then environment
//! variables. Validation runs last, on the merged result.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{AppConfig, RunMode, StartupOrdering};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of environment variables.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Load, merge and validate configuration.
pub fn load_config(path: Option<&Path>, env: &impl EnvSource) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => AppConfig::default(),
    };

    apply_env(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay environment variables onto `config`.
///
/// Empty values are treated as unset, so `PORT=` keeps the default port.
pub fn apply_env(config: &mut AppConfig, env: &impl EnvSource) -> Result<(), ConfigError> {
    let var = |key: &str| env.get(key).filter(|value| !value.is_empty());

    if let Some(value) = env.get("NODE_ENV") {
        config.mode = RunMode::from_node_env(Some(value.as_str()));
    }
    if let Some(port) = parsed(env, "PORT")? {
        config.server.port = port;
    }

    if let Some(host) = var("REDIS_HOST") {
        config.cache.host = host;
    }
    if let Some(port) = parsed(env, "REDIS_PORT")? {
        config.cache.port = port;
    }
    if let Some(password) = var("REDIS_PASSWORD") {
        config.cache.password = Some(password);
    }
    if let Some(tls) = parsed(env, "REDIS_TLS")? {
        config.cache.tls = tls;
    }

    if let Some(uri) = var("MONGO_URI") {
        config.database.uri = Some(uri);
    }
    if let Some(ordering) = parsed::<StartupOrdering>(env, "STARTUP_ORDER")? {
        config.startup.ordering = ordering;
    }
    if let Some(root) = var("FRONTEND_DIST") {
        config.static_files.root = PathBuf::from(root);
    }

    Ok(())
}

fn parsed<T>(env: &impl EnvSource, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env.get(key).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnv {
                key,
                reason: e.to_string(),
                value,
            }),
    }
}
