//! Connection supervisor and the shared handle.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::cache::connection::{CacheConnection, CacheConnector, CacheError};
use crate::cache::events::{CacheEvent, CacheState};
use crate::config::CacheConfig;
use crate::resilience::{ReconnectPolicy, RetryLimit};

const EVENT_CAPACITY: usize = 64;

/// Supervisor tuning, derived from [`CacheConfig`].
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub policy: ReconnectPolicy,
    pub max_retries_per_request: Option<u32>,
    pub ready_check: bool,
    pub connect_timeout: Duration,
    pub ping_interval: Duration,
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            policy: ReconnectPolicy::new(config.retry_step(), config.retry_cap()),
            max_retries_per_request: config.max_retries_per_request,
            ready_check: config.enable_ready_check,
            connect_timeout: config.connect_timeout(),
            ping_interval: config.ping_interval(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

struct Slot<C> {
    generation: u64,
    connection: C,
}

struct Shared<C> {
    slot: ArcSwapOption<Slot<C>>,
    generation: AtomicU64,
    state: watch::Sender<CacheState>,
    events: broadcast::Sender<CacheEvent>,
    /// Highest connection generation reported broken by a caller.
    broken: watch::Sender<u64>,
    endpoint: String,
}

impl<C> Shared<C> {
    fn set_state(&self, state: CacheState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: CacheEvent) {
        match &event {
            CacheEvent::Connected => {
                tracing::info!(endpoint = %self.endpoint, "Connected to cache");
            }
            CacheEvent::Ready => {
                tracing::info!(endpoint = %self.endpoint, "Cache connection ready");
            }
            CacheEvent::Error { message } => {
                tracing::error!(endpoint = %self.endpoint, error = %message, "Cache error");
            }
            CacheEvent::Reconnecting { attempt, delay } => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Reconnecting to cache"
                );
            }
            CacheEvent::Closed => {
                tracing::info!(endpoint = %self.endpoint, "Cache connection closed");
            }
        }
        let _ = self.events.send(event);
    }

    fn install(&self, connection: C) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.slot.store(Some(Arc::new(Slot {
            generation,
            connection,
        })));
        generation
    }

    fn clear(&self) {
        self.slot.store(None);
    }

    fn current_generation(&self) -> Option<u64> {
        self.slot.load().as_ref().map(|slot| slot.generation)
    }

    fn report_broken(&self, generation: u64) {
        self.broken.send_if_modified(|highest| {
            if generation > *highest {
                *highest = generation;
                true
            } else {
                false
            }
        });
    }
}

/// Owns the connector and drives the reconnect loop.
pub struct CacheManager<K: CacheConnector> {
    connector: K,
    settings: CacheSettings,
    shared: Arc<Shared<K::Connection>>,
}

impl<K: CacheConnector> CacheManager<K> {
    pub fn new(connector: K, settings: CacheSettings) -> Self {
        let (state, _) = watch::channel(CacheState::Connecting);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (broken, _) = watch::channel(0);
        let endpoint = connector.endpoint();

        Self {
            connector,
            settings,
            shared: Arc::new(Shared {
                slot: ArcSwapOption::empty(),
                generation: AtomicU64::new(0),
                state,
                events,
                broken,
                endpoint,
            }),
        }
    }

    /// Subscribe before [`spawn`](Self::spawn) to observe the first attempt.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.shared.events.subscribe()
    }

    pub fn handle(&self) -> CacheHandle<K::Connection> {
        CacheHandle {
            shared: self.shared.clone(),
            max_retries: self.settings.max_retries_per_request,
        }
    }

    /// Start the supervisor in the background and return the shared handle.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> CacheHandle<K::Connection> {
        let handle = self.handle();
        tokio::spawn(self.run(shutdown));
        handle
    }

    /// Supervise the connection until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            endpoint = %self.shared.endpoint,
            ready_check = self.settings.ready_check,
            "Cache supervisor starting"
        );

        let mut failures: u32 = 0;

        loop {
            let outcome = tokio::select! {
                outcome = self.establish() => outcome,
                _ = shutdown.recv() => break,
            };

            match outcome {
                Ok(mut connection) => {
                    let generation = self.shared.install(connection.clone());
                    self.shared.set_state(CacheState::Ready);
                    self.shared.emit(CacheEvent::Ready);
                    failures = 0;

                    let cause = tokio::select! {
                        cause = self.watch(&mut connection, generation) => cause,
                        _ = shutdown.recv() => break,
                    };
                    self.shared.clear();
                    self.shared.emit(CacheEvent::Error {
                        message: cause.to_string(),
                    });
                }
                Err(err) => {
                    self.shared.emit(CacheEvent::Error {
                        message: err.to_string(),
                    });
                }
            }

            failures = failures.saturating_add(1);
            let delay = self.settings.policy.delay_for(failures);
            self.shared.set_state(CacheState::Reconnecting);
            self.shared.emit(CacheEvent::Reconnecting {
                attempt: failures,
                delay,
            });

            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = shutdown.recv() => break,
            }
        }

        self.shared.clear();
        self.shared.set_state(CacheState::Closed);
        self.shared.emit(CacheEvent::Closed);
    }

    async fn establish(&self) -> Result<K::Connection, CacheError> {
        let timeout = self.settings.connect_timeout;
        let mut connection = time::timeout(timeout, self.connector.connect())
            .await
            .map_err(|_| CacheError::Timeout(timeout))??;

        self.shared.set_state(CacheState::Connected);
        self.shared.emit(CacheEvent::Connected);

        if self.settings.ready_check {
            time::timeout(timeout, connection.ready_check())
                .await
                .map_err(|_| CacheError::Timeout(timeout))??;
        }

        Ok(connection)
    }

    /// Returns why the connection stopped being usable.
    async fn watch(&self, connection: &mut K::Connection, generation: u64) -> CacheError {
        let interval = self.settings.ping_interval;
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut broken = self.shared.broken.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match time::timeout(self.settings.connect_timeout, connection.ping()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => return err,
                        Err(_) => return CacheError::Timeout(self.settings.connect_timeout),
                    }
                }
                // The `Ref` from `wait_for` is `!Send`; drop it inside the branch.
                _ = async { let _ = broken.wait_for(|highest| *highest >= generation).await; } => {
                    return CacheError::ConnectionLost;
                }
            }
        }
    }
}

/// Cloneable access to the supervised connection.
pub struct CacheHandle<C> {
    shared: Arc<Shared<C>>,
    max_retries: Option<u32>,
}

impl<C> Clone for CacheHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            max_retries: self.max_retries,
        }
    }
}

impl<C: CacheConnection> CacheHandle<C> {
    pub fn state(&self) -> CacheState {
        *self.shared.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == CacheState::Ready
    }

    pub fn status(&self) -> CacheStatus {
        CacheStatus(self.shared.state.subscribe())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.shared.events.subscribe()
    }

    pub fn endpoint(&self) -> &str {
        &self.shared.endpoint
    }

    /// Run `op` on the live connection.
    ///
    /// A connection-class failure reports the connection broken, waits for the
    /// supervisor to drop it and counts one retry. Every failed reconnect seen
    /// while waiting for a connection counts one retry too.
    pub async fn with_connection<T, F, Fut>(&self, mut op: F) -> Result<T, CacheError>
    where
        F: FnMut(C) -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        let mut state = self.shared.state.subscribe();
        let mut retries = RetryLimit::new(self.max_retries);

        loop {
            match self.shared.slot.load_full() {
                Some(slot) => match op(slot.connection.clone()).await {
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_connection_error() => {
                        tracing::warn!(error = %err, "Cache operation failed on a dead connection");
                        self.shared.report_broken(slot.generation);
                        while self.shared.current_generation() == Some(slot.generation) {
                            if state.changed().await.is_err() {
                                return Err(CacheError::Closed);
                            }
                        }
                    }
                    Err(err) => return Err(err),
                },
                None => {
                    if !self.await_connection(&mut state).await? {
                        continue;
                    }
                }
            }

            if !retries.record() {
                return Err(CacheError::RetriesExhausted {
                    retries: self.max_retries.unwrap_or_default(),
                });
            }
        }
    }

    /// Wait until a connection is installed (`false`) or a reconnect attempt
    /// fails (`true`).
    ///
    /// The slot is re-read after the current state is marked seen, so an
    /// install that lands between the caller's load and this call is not
    /// missed.
    async fn await_connection(
        &self,
        state: &mut watch::Receiver<CacheState>,
    ) -> Result<bool, CacheError> {
        loop {
            if *state.borrow_and_update() == CacheState::Closed {
                return Err(CacheError::Closed);
            }
            if self.shared.slot.load().is_some() {
                return Ok(false);
            }
            if state.changed().await.is_err() {
                return Err(CacheError::Closed);
            }
            match *state.borrow() {
                CacheState::Reconnecting => return Ok(true),
                CacheState::Closed => return Err(CacheError::Closed),
                _ => {}
            }
        }
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        self.with_connection(|mut connection| async move { connection.ping().await })
            .await
    }
}

/// Read-only view of the cache state, for health reporting.
#[derive(Debug, Clone)]
pub struct CacheStatus(watch::Receiver<CacheState>);

impl CacheStatus {
    /// A status pinned to `state`, for callers without a supervisor.
    pub fn fixed(state: CacheState) -> Self {
        let (_, rx) = watch::channel(state);
        Self(rx)
    }

    pub fn current(&self) -> CacheState {
        *self.0.borrow()
    }
}
