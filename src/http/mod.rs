//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, proxy handler)
//!     → request.rs (add request ID)
//!     → routing store (match against the live table)
//!     → filter chain request hooks (may shunt)
//!     → backend dispatch: network forward | shunt | loopback re-entry
//!     → filter chain response hooks (reverse order)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
