//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     ApiGroups (opaque handler groups)
//!     → table.rs (validate prefixes, keep registration order)
//!     → nest each group under its prefix
//!     → apply the fallback last (404, or the SPA in production)
//!     → Freeze as immutable axum Router
//!
//! Incoming Request:
//!     → first prefix that owns the path (prefixes are disjoint)
//!     → otherwise the fallback
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Prefixes are literal paths; wildcards only exist in the fallback
//! - The fallback is never a table entry, so it always sorts last

pub mod groups;
pub mod table;

pub use groups::{pending_group, ApiGroups};
pub use table::{MountPath, RouteTable, RoutingError, API_MOUNTS};
