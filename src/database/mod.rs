//! Primary store connection.
//!
//! # Data Flow
//! ```text
//! startup (per StartupOrdering)
//!     → PrimaryStore::connect_with(MongoConnector)
//!     → connector.connect() (client + ping)
//!     → state: pending → connecting → connected | failed
//!     → client kept for handler groups, state read by /healthz
//! ```
//!
//! # Design Decisions
//! - One connect attempt per process; no retry loop
//! - Whether a failure is fatal is decided by the startup policy, not here

pub mod mongo;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

pub use mongo::MongoConnector;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("no database URI configured (set MONGO_URI)")]
    MissingUri,

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("database did not respond within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Opens the primary store.
pub trait DatabaseConnector: Send + Sync + 'static {
    type Client: Clone + Send + Sync + 'static;

    fn connect(&self) -> BoxFuture<'_, Result<Self::Client, DatabaseError>>;

    /// Target description for logs. Must not contain credentials.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseState {
    Pending,
    Connecting,
    Connected,
    Failed,
}

impl DatabaseState {
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseState::Pending => "pending",
            DatabaseState::Connecting => "connecting",
            DatabaseState::Connected => "connected",
            DatabaseState::Failed => "failed",
        }
    }
}

/// Shared slot for the primary store client and its connection state.
pub struct PrimaryStore<D> {
    client: Arc<OnceLock<D>>,
    state: Arc<watch::Sender<DatabaseState>>,
}

impl<D> Clone for PrimaryStore<D> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: self.state.clone(),
        }
    }
}

impl<D: Clone + Send + Sync + 'static> PrimaryStore<D> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DatabaseState::Pending);
        Self {
            client: Arc::new(OnceLock::new()),
            state: Arc::new(state),
        }
    }

    /// The connected client, once available.
    pub fn client(&self) -> Option<D> {
        self.client.get().cloned()
    }

    pub fn state(&self) -> DatabaseState {
        *self.state.borrow()
    }

    pub fn status(&self) -> DatabaseStatus {
        DatabaseStatus(self.state.subscribe())
    }

    /// Connect once and record the outcome. The error is logged and returned.
    pub async fn connect_with<K>(&self, connector: &K) -> Result<(), DatabaseError>
    where
        K: DatabaseConnector<Client = D>,
    {
        let target = connector.describe();
        self.state.send_replace(DatabaseState::Connecting);
        tracing::info!(target_hosts = %target, "Connecting to database");

        match connector.connect().await {
            Ok(client) => {
                let _ = self.client.set(client);
                self.state.send_replace(DatabaseState::Connected);
                tracing::info!(target_hosts = %target, "Database connected");
                Ok(())
            }
            Err(err) => {
                self.state.send_replace(DatabaseState::Failed);
                tracing::error!(target_hosts = %target, error = %err, "Error connecting to database");
                Err(err)
            }
        }
    }
}

impl<D: Clone + Send + Sync + 'static> Default for PrimaryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the database state, for health reporting.
#[derive(Debug, Clone)]
pub struct DatabaseStatus(watch::Receiver<DatabaseState>);

impl DatabaseStatus {
    /// A status pinned to `state`, for callers without a store.
    pub fn fixed(state: DatabaseState) -> Self {
        let (_, rx) = watch::channel(state);
        Self(rx)
    }

    pub fn current(&self) -> DatabaseState {
        *self.0.borrow()
    }
}
