//! Route lookup and dispatch table.
//!
//! # Responsibilities
//! - Hold compiled routes (matchers + filter chains)
//! - Look up the matching route for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks); updates swap
//!   in a whole new table via the route store
//! - First match wins, in definition order
//! - A route that fails to compile is skipped with a warning; one bad route
//!   must not take down the rest of the table

use axum::body::Body;
use axum::http::Request;

use super::matcher::{compile_matchers, Matcher};
use crate::filters::{Registry, RequestFilter};
use crate::routex::Route;

/// One route with its compiled matchers and filter chain.
pub struct CompiledRoute {
    pub route: Route,
    matchers: Vec<Box<dyn Matcher>>,
    pub filters: Vec<Box<dyn RequestFilter>>,
}

impl CompiledRoute {
    pub fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

/// Immutable compiled route table.
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compiles a route table, skipping routes whose regexps or filter
    /// chains fail to build.
    pub fn compile(routes: Vec<Route>, registry: &Registry) -> Self {
        let mut compiled = Vec::with_capacity(routes.len());
        for route in routes {
            let matchers = match compile_matchers(&route) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(route_id = %route.id, error = %e, "skipping route");
                    continue;
                }
            };
            let filters = match registry.create_chain(&route) {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(route_id = %route.id, error = %e, "skipping route");
                    continue;
                }
            };
            compiled.push(CompiledRoute {
                route,
                matchers,
                filters,
            });
        }
        Self { routes: compiled }
    }

    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// Returns the first route matching the request, if any.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&CompiledRoute> {
        self.routes.iter().find(|r| r.matches(req))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The route values in table order, for printing and diagnostics.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|c| &c.route)
    }
}
