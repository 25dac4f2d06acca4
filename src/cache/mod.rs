//! Cache connection subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → CacheManager::new(RedisConnector, CacheSettings)
//!     → spawn supervisor task (never blocks request serving)
//!
//! supervisor loop:
//!     connect ─ok→ Connected → [ready check] → Ready → ping until lost
//!        │                                                   │
//!        └─fail→ Error → Reconnecting{n, min(n×50ms, 2s)} ←───┘
//!     shutdown → Closed
//!
//! request handlers:
//!     CacheHandle::with_connection(op)
//!     → live connection from the slot, or wait for the next one
//!     → connection failures count against max_retries_per_request
//! ```
//!
//! # Design Decisions
//! - One connection per process, shared by clone (multiplexed)
//! - Connection errors are logged and retried forever, never fatal
//! - The handle is passed explicitly to whoever needs it; there is no global

pub mod client;
pub mod connection;
pub mod events;
pub mod manager;

pub use client::RedisConnector;
pub use connection::{CacheConnection, CacheConnector, CacheError};
pub use events::{CacheEvent, CacheState};
pub use manager::{CacheHandle, CacheManager, CacheSettings, CacheStatus};
