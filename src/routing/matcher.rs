//! Route matching logic.
//!
//! # Responsibilities
//! - Compile parsed route predicates into request matchers
//! - Match exact path, host/path regexps, method, and headers
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores the port (per HTTP spec)
//! - Path matching is case-sensitive and exact
//! - A route with no conditions is a wildcard: it always matches
//! - Regexps are compiled once per route table build, never per request

use axum::body::Body;
use axum::http::{header, Request};
use regex::Regex;
use thiserror::Error;

use crate::routex::Route;

/// Error compiling one route's predicates.
#[derive(Debug, Error)]
pub enum MatchCompileError {
    #[error("invalid regexp in route {route_id:?}: {source}")]
    Regex {
        route_id: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches the request path exactly.
struct ExactPathMatcher {
    path: String,
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path() == self.path
    }
}

/// Matches the Host header (port stripped) against a regexp.
struct HostRegexpMatcher {
    regex: Regex,
}

impl Matcher for HostRegexpMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        request_host(req)
            .map(|host| self.regex.is_match(&host))
            .unwrap_or(false)
    }
}

/// Matches the request path against a regexp.
struct PathRegexpMatcher {
    regex: Regex,
}

impl Matcher for PathRegexpMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.regex.is_match(req.uri().path())
    }
}

/// Matches the request method.
struct MethodMatcher {
    method: String,
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.method().as_str().eq_ignore_ascii_case(&self.method)
    }
}

/// Matches one header for an exact value.
struct HeaderMatcher {
    name: String,
    value: String,
}

impl Matcher for HeaderMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.headers()
            .get_all(&self.name)
            .iter()
            .any(|v| v.to_str().map(|v| v == self.value).unwrap_or(false))
    }
}

/// Matches one header against a regexp.
struct HeaderRegexpMatcher {
    name: String,
    regex: Regex,
}

impl Matcher for HeaderRegexpMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.headers()
            .get_all(&self.name)
            .iter()
            .any(|v| v.to_str().map(|v| self.regex.is_match(v)).unwrap_or(false))
    }
}

fn request_host(req: &Request<Body>) -> Option<String> {
    let raw = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().host().map(str::to_string))?;
    let host = raw.rsplit_once(':').map(|(h, _)| h).unwrap_or(&raw);
    Some(host.to_lowercase())
}

fn compile_regex(route_id: &str, pattern: &str) -> Result<Regex, MatchCompileError> {
    Regex::new(pattern).map_err(|e| MatchCompileError::Regex {
        route_id: route_id.to_string(),
        source: Box::new(e),
    })
}

/// Compiles a route's predicates into its matcher set.
///
/// Generic predicates (including `Any`) carry no engine semantics and
/// contribute no conditions; their meaning belongs to external predicate
/// providers.
pub fn compile_matchers(route: &Route) -> Result<Vec<Box<dyn Matcher>>, MatchCompileError> {
    let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();

    if !route.path.is_empty() {
        matchers.push(Box::new(ExactPathMatcher {
            path: route.path.clone(),
        }));
    }

    for pattern in &route.host_regexps {
        matchers.push(Box::new(HostRegexpMatcher {
            regex: compile_regex(&route.id, pattern)?,
        }));
    }

    for pattern in &route.path_regexps {
        matchers.push(Box::new(PathRegexpMatcher {
            regex: compile_regex(&route.id, pattern)?,
        }));
    }

    if !route.method.is_empty() {
        matchers.push(Box::new(MethodMatcher {
            method: route.method.clone(),
        }));
    }

    for (name, value) in &route.headers {
        matchers.push(Box::new(HeaderMatcher {
            name: name.to_lowercase(),
            value: value.clone(),
        }));
    }

    for (name, patterns) in &route.header_regexps {
        for pattern in patterns {
            matchers.push(Box::new(HeaderRegexpMatcher {
                name: name.to_lowercase(),
                regex: compile_regex(&route.id, pattern)?,
            }));
        }
    }

    Ok(matchers)
}
