//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! route file (route expression text)
//!     → loader.rs → routex::parse
//!     → initial RouteUpdate::Replace
//!
//! On route file change:
//!     watcher.rs detects change
//!     → reparse route file
//!     → push RouteUpdate over the update channel
//!     → route store swaps the compiled table
//! ```
//!
//! # Design Decisions
//! - Gateway settings are immutable once loaded; only routes hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_routes, ConfigError};
pub use schema::GatewayConfig;
pub use watcher::RouteWatcher;
