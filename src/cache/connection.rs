//! Connector seams and the cache error type.

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache endpoint: {0}")]
    InvalidEndpoint(String),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("server is loading the dataset in memory")]
    Loading,

    #[error("connection lost")]
    ConnectionLost,

    #[error("gave up after {retries} retries")]
    RetriesExhausted { retries: u32 },

    #[error("cache connection closed")]
    Closed,
}

impl CacheError {
    /// Errors that mean the connection itself is unusable.
    pub fn is_connection_error(&self) -> bool {
        match self {
            CacheError::Redis(e) => {
                e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
            }
            CacheError::Timeout(_) | CacheError::ConnectionLost => true,
            _ => false,
        }
    }
}

/// An established connection the supervisor can ping.
pub trait CacheConnection: Clone + Send + Sync + 'static {
    /// Cheap liveness check.
    fn ping(&mut self) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Check the server is ready to serve. Runs once per connection when enabled.
    fn ready_check(&mut self) -> BoxFuture<'_, Result<(), CacheError>> {
        self.ping()
    }
}

/// Opens connections to one endpoint.
pub trait CacheConnector: Send + Sync + 'static {
    type Connection: CacheConnection;

    fn connect(&self) -> BoxFuture<'_, Result<Self::Connection, CacheError>>;

    /// Endpoint description for logs. Must not contain credentials.
    fn endpoint(&self) -> String;
}
