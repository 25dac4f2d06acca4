//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (cache state changes, startup, request rejections)
//!     → per-request spans from the HTTP trace layer, tagged with x-request-id
//!
//! Consumers:
//!     → logging.rs (stdout, JSON or pretty)
//! ```

pub mod logging;
