//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware stack)
//!     → request.rs (request id, trace span)
//!     → body limit → body.rs (JSON) → cookies.rs
//!     → routing (mounted groups, /healthz)
//!     → static_files.rs (404 or SPA fallback)
//! ```

pub mod body;
pub mod cookies;
pub mod error;
pub mod health;
pub mod request;
pub mod server;
pub mod static_files;

pub use body::JsonBody;
pub use cookies::Cookies;
pub use error::AppError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
