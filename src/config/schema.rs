//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! field has a default so an empty file (or no file at all) is a valid config.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Development or production, resolved once at startup.
    pub mode: RunMode,

    /// Listener and request parsing settings.
    pub server: ServerConfig,

    /// Frontend bundle served in production.
    pub static_files: StaticConfig,

    /// Cache/session store connection.
    pub cache: CacheConfig,

    /// Primary data store connection.
    pub database: DatabaseConfig,

    /// Startup ordering policy.
    pub startup: StartupConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Process run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// API routes only.
    #[default]
    Development,
    /// API routes, static serving and SPA fallback.
    Production,
}

impl RunMode {
    /// Only the exact value `production` selects production mode.
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => RunMode::Production,
            _ => RunMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == RunMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Maximum accepted request body in bytes.
    pub body_limit_bytes: usize,
}

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Location of the prebuilt frontend bundle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Build directory, relative to the working directory unless absolute.
    pub root: PathBuf,

    /// Entry document served for unmatched routes.
    pub index: String,
}

impl StaticConfig {
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("frontend").join("dist"),
            index: "index.html".to_string(),
        }
    }
}

/// Cache connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub host: String,

    pub port: u16,

    /// Password sent on connect, if any.
    pub password: Option<String>,

    /// Connect over TLS (`rediss://`).
    pub tls: bool,

    /// Retries allowed for one operation before it fails. `None` waits forever.
    pub max_retries_per_request: Option<u32>,

    /// Check the server for readiness before reporting ready.
    pub enable_ready_check: bool,

    /// Client name registered with `CLIENT SETNAME`.
    pub connection_name: String,

    /// Backoff increment per consecutive failure.
    pub retry_step_ms: u64,

    /// Backoff ceiling.
    pub retry_cap_ms: u64,

    /// Deadline for a single connection attempt.
    pub connect_timeout_ms: u64,

    /// Interval between liveness pings on an established connection.
    pub ping_interval_ms: u64,
}

impl CacheConfig {
    pub fn retry_step(&self) -> Duration {
        Duration::from_millis(self.retry_step_ms)
    }

    pub fn retry_cap(&self) -> Duration {
        Duration::from_millis(self.retry_cap_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            tls: true,
            max_retries_per_request: Some(5),
            enable_ready_check: false,
            connection_name: "storefront".to_string(),
            retry_step_ms: 50,
            retry_cap_ms: 2000,
            connect_timeout_ms: 10_000,
            ping_interval_ms: 10_000,
        }
    }
}

/// Primary store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// MongoDB connection string.
    pub uri: Option<String>,

    /// Application name reported to the server.
    pub app_name: String,

    /// Deadline for the initial connect and ping.
    pub connect_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: None,
            app_name: "storefront".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

/// When the primary store is connected relative to accepting traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StartupOrdering {
    /// Connect the database before binding; failure aborts startup.
    #[default]
    DatabaseFirst,
    /// Bind first, then connect the database in the background; failure is logged.
    ServeFirst,
}

impl std::str::FromStr for StartupOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "database-first" => Ok(StartupOrdering::DatabaseFirst),
            "serve-first" => Ok(StartupOrdering::ServeFirst),
            other => Err(format!(
                "expected `database-first` or `serve-first`, got `{other}`"
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StartupConfig {
    pub ordering: StartupOrdering,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format. Unset means JSON in production, pretty otherwise.
    pub log_format: Option<LogFormat>,
}

impl ObservabilityConfig {
    pub fn format_for(&self, mode: RunMode) -> LogFormat {
        self.log_format.unwrap_or(match mode {
            RunMode::Production => LogFormat::Json,
            RunMode::Development => LogFormat::Pretty,
        })
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
        }
    }
}
