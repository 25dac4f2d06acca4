//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Cache connection attempt fails:
//!     → backoff.rs (delay for the n-th consecutive failure)
//!     → supervisor sleeps, then retries (no attempt cap)
//!
//! Cache operation fails on a dead connection:
//!     → retries.rs (count against the per-request ceiling)
//!     → retry on the next live connection, or give up
//! ```
//!
//! # Design Decisions
//! - Reconnect delay grows linearly and is capped; it never stops retrying
//! - The per-request ceiling bounds how long one caller waits, not the supervisor

pub mod backoff;
pub mod retries;

pub use backoff::ReconnectPolicy;
pub use retries::RetryLimit;
