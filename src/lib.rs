//! Storefront server library.
//!
//! HTTP front door for an e-commerce backend: mounts the API handler groups,
//! parses JSON bodies and cookies, serves the frontend bundle in production,
//! and keeps the cache and primary store connections alive.

pub mod cache;
pub mod config;
pub mod database;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{launch, Shutdown};
