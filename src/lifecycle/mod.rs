//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Spawn cache supervisor → Compile routes
//!     → [database-first] connect primary store, abort on failure
//!     → Bind listener → Serve
//!     → [serve-first] connect primary store in the background
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain in-flight requests → Close cache
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Startup ordering is configuration, not code
//! - A failed database connect in serve-first mode is logged, never fatal
//! - One broadcast channel fans shutdown out to every task

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_handler, wait_for_signal};
pub use startup::{launch, Launched, Services, StartupError};
