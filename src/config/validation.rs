//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, backoff cap >= step)
//! - Check that the startup policy has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{AppConfig, StartupOrdering};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }
    if config.server.body_limit_bytes == 0 {
        errors.push(ValidationError::new("server.body_limit_bytes", "must be greater than zero"));
    }

    let index = &config.static_files.index;
    if index.is_empty() || index.contains('/') || index.contains('\\') {
        errors.push(ValidationError::new(
            "static_files.index",
            "must be a plain file name inside the build directory",
        ));
    }

    let cache = &config.cache;
    if cache.host.trim().is_empty() {
        errors.push(ValidationError::new("cache.host", "must not be empty"));
    }
    if cache.port == 0 {
        errors.push(ValidationError::new("cache.port", "must not be zero"));
    }
    if cache.retry_step_ms == 0 {
        errors.push(ValidationError::new("cache.retry_step_ms", "must be greater than zero"));
    }
    if cache.retry_cap_ms < cache.retry_step_ms {
        errors.push(ValidationError::new(
            "cache.retry_cap_ms",
            format!("must be at least retry_step_ms ({})", cache.retry_step_ms),
        ));
    }
    if cache.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("cache.connect_timeout_ms", "must be greater than zero"));
    }
    if cache.ping_interval_ms == 0 {
        errors.push(ValidationError::new("cache.ping_interval_ms", "must be greater than zero"));
    }

    if config.startup.ordering == StartupOrdering::DatabaseFirst
        && config.database.uri.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::new(
            "database.uri",
            "required when startup.ordering is database-first (set MONGO_URI)",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("must be one of {}", LOG_LEVELS.join(", ")),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
