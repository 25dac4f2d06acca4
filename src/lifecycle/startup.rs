//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the cache supervisor
//! - Compile the route table against the shared services
//! - Connect the primary store according to the configured ordering
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: in database-first mode a failed connect aborts startup
//! - Any startup failure triggers shutdown so the cache supervisor exits
//! - The cache never blocks startup; it reconnects in the background
//! - Listeners start last in database-first mode, first in serve-first mode

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::cache::{CacheConnector, CacheHandle, CacheManager, CacheSettings};
use crate::config::{AppConfig, RunMode, StartupOrdering};
use crate::database::{DatabaseConnector, DatabaseError, PrimaryStore};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::routing::{RouteTable, RoutingError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid route table: {0}")]
    Routing(#[from] RoutingError),

    #[error("database connection failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Long-lived clients shared with the handler groups.
pub struct Services<C, D> {
    pub mode: RunMode,
    pub cache: CacheHandle<C>,
    pub database: PrimaryStore<D>,
}

impl<C, D> Clone for Services<C, D>
where
    D: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            cache: self.cache.clone(),
            database: self.database.clone(),
        }
    }
}

/// A server that is accepting connections.
pub struct Launched<C, D> {
    pub local_addr: SocketAddr,
    pub services: Services<C, D>,
    server: JoinHandle<io::Result<()>>,
}

impl<C, D> Launched<C, D> {
    /// Wait for the server to finish draining after shutdown.
    pub async fn wait(self) -> Result<(), StartupError> {
        self.server.await?.map_err(StartupError::Serve)
    }
}

/// Start every subsystem and begin serving.
///
/// `mount` receives the shared services and returns the route table for the
/// handler groups.
pub async fn launch<K, M, F>(
    config: &AppConfig,
    cache: K,
    database: M,
    mount: F,
    shutdown: &Shutdown,
) -> Result<Launched<K::Connection, M::Client>, StartupError>
where
    K: CacheConnector,
    M: DatabaseConnector,
    F: FnOnce(&Services<K::Connection, M::Client>) -> Result<RouteTable, RoutingError>,
{
    let manager = CacheManager::new(cache, CacheSettings::from(&config.cache));
    let services = Services {
        mode: config.mode,
        cache: manager.spawn(shutdown.subscribe()),
        database: PrimaryStore::new(),
    };

    // The supervisor is already running; stop it before reporting a failure.
    let abort = |err: StartupError| {
        shutdown.trigger();
        err
    };

    let routes = mount(&services).map_err(|err| abort(err.into()))?;
    tracing::debug!(mounts = ?routes.paths(), "Route table compiled");

    let ordering = config.startup.ordering;
    if ordering == StartupOrdering::DatabaseFirst {
        services
            .database
            .connect_with(&database)
            .await
            .map_err(|err| abort(err.into()))?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| abort(StartupError::Bind { addr, source }))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| abort(StartupError::Serve(err)))?;

    let state = AppState {
        mode: config.mode,
        cache: services.cache.status(),
        database: services.database.status(),
    };
    let server = HttpServer::new(config, state, routes);
    let server = tokio::spawn(server.run(listener, shutdown.signalled()));

    tracing::info!(
        mode = config.mode.as_str(),
        "Server is running on http://localhost:{}",
        local_addr.port()
    );

    if ordering == StartupOrdering::ServeFirst {
        let store = services.database.clone();
        tokio::spawn(async move {
            // Failure is already logged and visible on /healthz.
            let _ = store.connect_with(&database).await;
        });
    }

    Ok(Launched {
        local_addr,
        services,
        server,
    })
}
