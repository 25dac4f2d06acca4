//! Cache lifecycle states and events.

use std::time::Duration;

use serde::Serialize;

/// Where the supervised connection currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// First attempt in progress.
    Connecting,
    /// Transport established, ready check pending.
    Connected,
    /// Usable.
    Ready,
    /// Waiting out a backoff delay or retrying.
    Reconnecting,
    /// Shut down; no further attempts.
    Closed,
}

impl CacheState {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheState::Connecting => "connecting",
            CacheState::Connected => "connected",
            CacheState::Ready => "ready",
            CacheState::Reconnecting => "reconnecting",
            CacheState::Closed => "closed",
        }
    }
}

/// Observable transitions, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Connected,
    Ready,
    /// An attempt or a live connection failed.
    Error { message: String },
    /// A retry is scheduled after `delay`; `attempt` counts consecutive failures.
    Reconnecting { attempt: u32, delay: Duration },
    Closed,
}
