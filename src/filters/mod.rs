//! Filter runtime and registry.
//!
//! # Data Flow
//! ```text
//! Parsed Route.filters: [(name, args), ...]
//!     → Registry (name → FilterSpec)
//!     → spec.create(args) per entry
//!     → compiled chain: Vec<Box<dyn RequestFilter>>
//!
//! Per request:
//!     chain.on_request() in order (a filter may serve and shunt)
//!     → backend dispatch (unless served)
//!     → chain.on_response() in reverse order
//! ```
//!
//! # Design Decisions
//! - The route expression core only guarantees that (name, args) pairs
//!   round-trip; argument semantics live entirely in the specs here
//! - Specs validate arguments at chain-build time, not per request
//! - Filters are trait objects, same pattern as the route matchers

pub mod flowid;
pub mod redirect;
pub mod set_path;

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, Response};
use thiserror::Error;

use crate::routex::{Arg, Route};

/// Error building a filter chain from a parsed route.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown filter {name:?} in route {route_id:?}")]
    Unknown { name: String, route_id: String },

    #[error("invalid arguments for filter {name:?}: {reason}")]
    InvalidArgs { name: String, reason: &'static str },
}

/// Per-request state handed to filter hooks.
///
/// A filter that calls [`FilterContext::serve`] terminates the chain: no
/// further request hooks run and the backend is not contacted.
pub struct FilterContext {
    request: Request<Body>,
    response: Option<Response<Body>>,
    served: bool,
}

impl FilterContext {
    pub fn new(request: Request<Body>) -> Self {
        Self {
            request,
            response: None,
            served: false,
        }
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// The backend (or served) response, present during response hooks.
    pub fn response_mut(&mut self) -> Option<&mut Response<Body>> {
        self.response.as_mut()
    }

    pub fn set_response(&mut self, response: Response<Body>) {
        self.response = Some(response);
    }

    /// Serve `response` directly and stop request processing.
    pub fn serve(&mut self, response: Response<Body>) {
        self.response = Some(response);
        self.served = true;
    }

    pub fn is_served(&self) -> bool {
        self.served
    }

    /// Consumes the context, yielding the request for backend dispatch.
    pub fn into_request(self) -> Request<Body> {
        self.request
    }

    pub fn take_response(&mut self) -> Option<Response<Body>> {
        self.response.take()
    }
}

/// A constructible filter kind, registered by name.
pub trait FilterSpec: Send + Sync {
    /// Canonical filter name as written in route expressions.
    fn name(&self) -> &'static str;

    /// Builds an instance from parsed arguments.
    fn create(&self, args: &[Arg]) -> Result<Box<dyn RequestFilter>, FilterError>;
}

/// An instantiated filter with its lifecycle hooks.
pub trait RequestFilter: Send + Sync {
    /// Runs on the inbound request, in chain order.
    fn on_request(&self, ctx: &mut FilterContext);

    /// Runs on the outbound response, in reverse chain order.
    fn on_response(&self, ctx: &mut FilterContext) {
        let _ = ctx;
    }
}

impl std::fmt::Debug for dyn RequestFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RequestFilter")
    }
}

/// Maps filter names to specs and compiles chains for parsed routes.
pub struct Registry {
    specs: HashMap<&'static str, Box<dyn FilterSpec>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in filters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(redirect::RedirectToSpec));
        registry.register(Box::new(flowid::FlowIdSpec::default()));
        registry.register(Box::new(set_path::SetPathSpec));
        registry
    }

    pub fn register(&mut self, spec: Box<dyn FilterSpec>) {
        self.specs.insert(spec.name(), spec);
    }

    /// Builds the filter chain for one route, in execution order.
    pub fn create_chain(&self, route: &Route) -> Result<Vec<Box<dyn RequestFilter>>, FilterError> {
        route
            .filters
            .iter()
            .map(|f| {
                let spec = self.specs.get(f.name.as_str()).ok_or_else(|| {
                    FilterError::Unknown {
                        name: f.name.clone(),
                        route_id: route.id.clone(),
                    }
                })?;
                spec.create(&f.args)
            })
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
