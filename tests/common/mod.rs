//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use storefront::cache::{CacheConnection, CacheConnector, CacheError};
use storefront::config::{AppConfig, RunMode, StartupOrdering};
use storefront::database::{DatabaseConnector, DatabaseError};

/// Config bound to an ephemeral local port.
pub fn config(mode: RunMode, ordering: StartupOrdering) -> AppConfig {
    let mut config = AppConfig::default();
    config.mode = mode;
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.startup.ordering = ordering;
    config.database.uri = Some("mongodb://fake:27017/shop".into());
    config
}

/// A prebuilt frontend bundle in a fresh temporary directory.
pub fn frontend_bundle() -> PathBuf {
    let root = std::env::temp_dir().join(format!("storefront-it-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("index.html"), "<!doctype html><title>Store</title><div id=root></div>").unwrap();
    fs::write(root.join("assets").join("main.css"), "body{margin:0}").unwrap();
    root
}

#[derive(Clone)]
pub struct FakeConnection;

impl CacheConnection for FakeConnection {
    fn ping(&mut self) -> BoxFuture<'_, Result<(), CacheError>> {
        async { Ok(()) }.boxed()
    }
}

/// Cache endpoint that is either always up or always down.
pub struct FakeCache {
    pub up: bool,
    pub attempts: Arc<AtomicU32>,
}

impl FakeCache {
    pub fn up() -> Self {
        Self {
            up: true,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn down() -> Self {
        Self {
            up: false,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl CacheConnector for FakeCache {
    type Connection = FakeConnection;

    fn connect(&self) -> BoxFuture<'_, Result<FakeConnection, CacheError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let up = self.up;
        async move {
            if up {
                Ok(FakeConnection)
            } else {
                Err(CacheError::ConnectionLost)
            }
        }
        .boxed()
    }

    fn endpoint(&self) -> String {
        "fake-cache:6379".into()
    }
}

/// Database that answers after `delay` with a fixed outcome.
pub struct FakeDatabase {
    pub delay: Duration,
    pub fail: bool,
}

impl FakeDatabase {
    pub fn ok() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { delay, fail: false }
    }
}

impl DatabaseConnector for FakeDatabase {
    type Client = String;

    fn connect(&self) -> BoxFuture<'_, Result<String, DatabaseError>> {
        async move {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(DatabaseError::Other("connection refused".into()))
            } else {
                Ok("fake-client".to_string())
            }
        }
        .boxed()
    }

    fn describe(&self) -> String {
        "fake:27017".into()
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..40 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
