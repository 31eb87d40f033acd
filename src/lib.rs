//! Routegate: an HTTP gateway driven by a route expression language.
//!
//! Routes are written in a compact textual form that round-trips
//! losslessly through [`routex::parse`] and [`routex::print_routes`]. The
//! same text is used in route files, dynamic updates and admin diagnostics.

pub mod admin;
pub mod config;
pub mod filters;
pub mod http;
pub mod observability;
pub mod routex;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use routex::{parse, print_routes, Route};
