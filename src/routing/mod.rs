//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, method, headers)
//!     → store.rs (load current table snapshot)
//!     → router.rs (first-match lookup)
//!     → matcher.rs (evaluate compiled conditions)
//!     → Return: matched CompiledRoute or NoMatch
//!
//! Table build (startup and on every update):
//!     route expression text
//!     → routex::parse
//!     → compile matchers + filter chains
//!     → freeze as immutable RouteTable, swap into the store
//! ```
//!
//! # Design Decisions
//! - Tables compiled on update, immutable at request time
//! - First match wins, in definition order
//! - Regex compilation happens off the hot path

pub mod matcher;
pub mod router;
pub mod store;

pub use router::{CompiledRoute, RouteTable};
pub use store::{RouteStore, RouteUpdate};
