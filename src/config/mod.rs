//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (dotenvy, optional)
//!     → process environment
//!
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (overlay PORT, NODE_ENV, REDIS_*, MONGO_URI, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the run mode is resolved exactly once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, EnvSource, ProcessEnv};
pub use schema::{
    AppConfig, CacheConfig, DatabaseConfig, LogFormat, ObservabilityConfig, RunMode,
    ServerConfig, StartupConfig, StartupOrdering, StaticConfig,
};
